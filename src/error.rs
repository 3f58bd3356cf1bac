use thiserror::Error;

/// The one error type every public operation returns.
///
/// Low-level failures (gzip, UTF-8, integer overflow) are converted into one
/// of these variants at the point they cross into `ops`; callers never see a
/// raw I/O or codec error directly.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Outer magic didn't match `"FLNTVLT\0"`.
    #[error("not a flint vault")]
    NotAVault,

    /// Header version isn't 1.
    #[error("unsupported vault version: {0}")]
    UnsupportedVersion(u32),

    /// KDF iteration count out of range, or declared ciphertext length is
    /// inconsistent with the file on disk.
    #[error("bad vault header: {0}")]
    BadHeader(String),

    /// File or inner stream ended before a declared field was fully read.
    #[error("vault file is truncated")]
    Truncated,

    /// AES-256-GCM authentication failed. Deliberately indistinguishable from
    /// a wrong password: revealing which one it was would leak information
    /// to an attacker guessing passwords against a tampered file.
    #[error("wrong password or corrupted vault")]
    BadPasswordOrCorrupt,

    /// gzip, codec, or trailer-checksum failure discovered *after* a
    /// successful decryption.
    #[error("corrupt vault payload: {0}")]
    Corrupt(String),

    /// `create` target already exists.
    #[error("vault already exists")]
    AlreadyExists,

    /// Vault file missing, or a remove/extract selector matched nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Flatten-mode extraction would overwrite one output file with another.
    #[error("extract collision: {0}")]
    Collision(String),

    /// Wrapped filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed path, empty password, or a nonsensical option combination.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation aborted via a `CancelFlag`.
    #[error("operation cancelled")]
    Cancelled,
}
