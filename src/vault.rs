//! Read-transform-write glue: container <-> crypto <-> codec <-> model.
//!
//! Every mutating operation in [`crate::ops`] goes through [`load`] then,
//! after mutating the returned [`Directory`], [`store`]. This is the only
//! place a derived key or a decrypted payload is held, and both are
//! released (zeroized, for the key) as soon as this function returns.

use std::path::Path;

use crate::consts::{KDF_ITERATIONS_DEFAULT, NONCE_SIZE, SALT_SIZE};
use crate::crypto::{cipher, kdf, random_bytes};
use crate::error::VaultError;
use crate::model::Directory;
use crate::{codec, format};

/// Load and decrypt the vault at `path`, returning its directory model.
///
/// Fails with [`VaultError::NotFound`] if `path` doesn't exist,
/// [`VaultError::BadPasswordOrCorrupt`] if `password` doesn't match, and the
/// container/codec error taxonomy for any other malformed input.
pub(crate) fn load(path: &Path, password: &[u8]) -> Result<Directory, VaultError> {
    if !path.exists() {
        return Err(VaultError::NotFound(path.display().to_string()));
    }

    let raw = std::fs::read(path)?;
    let (header, ciphertext) = format::decode(&raw)?;

    let key = kdf::derive_key(password, &header.salt, header.kdf_iterations)?;
    let plaintext = cipher::open(&key, &header.nonce, ciphertext)?;

    let dir = codec::decode(&plaintext).map_err(|e| VaultError::Corrupt(e.to_string()))?;
    log::debug!("loaded vault {} ({} entries)", path.display(), dir.len());
    Ok(dir)
}

/// Serialize, seal with a freshly generated salt and nonce, and atomically
/// write `dir` to `path` — a full rewrite of the container every time.
pub(crate) fn store(path: &Path, password: &[u8], dir: &Directory) -> Result<(), VaultError> {
    let plaintext = codec::encode(dir);

    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&random_bytes(SALT_SIZE));
    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(&random_bytes(NONCE_SIZE));

    let key = kdf::derive_key(password, &salt, KDF_ITERATIONS_DEFAULT)?;
    let ciphertext = cipher::seal(&key, &nonce, &plaintext)?;

    let header = format::VaultHeader {
        version: crate::consts::VERSION,
        kdf_iterations: KDF_ITERATIONS_DEFAULT,
        salt,
        nonce,
        ciphertext_length: ciphertext.len() as u64,
    };

    let encoded = format::encode(&header, &ciphertext);
    format::atomic_write(path, &encoded)?;
    log::debug!("wrote vault {} ({} entries)", path.display(), dir.len());
    Ok(())
}
