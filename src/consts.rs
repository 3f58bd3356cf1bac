//! Wire constants shared by the container, codec and crypto layers.

/// Outer container magic, offset 0, 8 bytes.
pub(crate) const MAGIC: &[u8; 8] = b"FLNTVLT\0";

/// Current (only) container format version.
pub(crate) const VERSION: u32 = 1;

/// PBKDF2-HMAC-SHA256 salt size in bytes.
pub(crate) const SALT_SIZE: usize = 32;

/// AES-256-GCM nonce size in bytes (96-bit, standard for GCM).
pub(crate) const NONCE_SIZE: usize = 12;

/// AES-256-GCM authentication tag size in bytes, appended to every ciphertext.
pub(crate) const GCM_TAG_SIZE: usize = 16;

/// Default PBKDF2 iteration count for newly written vaults.
pub(crate) const KDF_ITERATIONS_DEFAULT: u32 = 100_000;

/// Lower bound on an iteration count read back from a header; below this the
/// KDF is considered too weak to trust and the header is rejected.
pub(crate) const KDF_ITERATIONS_MIN: u32 = 10_000;

/// Upper bound on an iteration count read back from a header; above this the
/// header is almost certainly corrupt (or a denial-of-service attempt).
pub(crate) const KDF_ITERATIONS_MAX: u32 = 10_000_000;

/// `magic(8) + version(4) + kdf_iterations(4) + salt(32) + nonce(12) + ciphertext_length(8)`.
pub(crate) const HEADER_SIZE: usize = 8 + 4 + 4 + SALT_SIZE + NONCE_SIZE + 8;

/// Codec-level magic prefixed to the plaintext (pre-gzip) directory stream.
pub(crate) const CODEC_MAGIC: &[u8; 8] = b"FVDIR\0\0\0";

/// Maximum normalized path length, in bytes.
pub(crate) const MAX_PATH_LEN: usize = 4096;

/// Maximum length of a single path segment, in bytes.
pub(crate) const MAX_SEGMENT_LEN: usize = 255;

/// Default worker count ceiling, and floor, for the parallel runner.
pub(crate) const MAX_WORKERS: usize = 16;
pub(crate) const MIN_WORKERS: usize = 1;
