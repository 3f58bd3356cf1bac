//! Key derivation and authenticated encryption primitives.
//!
//! Nothing in this module touches the filesystem or the directory model —
//! it seals and opens opaque byte buffers only. The container layer decides
//! what those buffers mean.

pub mod cipher;
pub mod kdf;

use rand::{rngs::OsRng, RngCore};

/// Fill a freshly allocated buffer with CSRNG bytes (salt, nonce generation).
pub fn random_bytes(n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    OsRng.fill_bytes(&mut buf);
    buf
}
