use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use zeroize::Zeroizing;

use crate::consts::{GCM_TAG_SIZE, NONCE_SIZE};
use crate::crypto::kdf::KEY_SIZE;
use crate::error::VaultError;

/// Seal `plaintext` with AES-256-GCM under `key`/`nonce`, empty additional data.
///
/// Output length is `plaintext.len() + 16` (the GCM tag is appended).
pub fn seal(
    key: &Zeroizing<[u8; KEY_SIZE]>,
    nonce: &[u8; NONCE_SIZE],
    plaintext: &[u8],
) -> Result<Vec<u8>, VaultError> {
    let cipher_key = Key::<Aes256Gcm>::from_slice(key.as_ref());
    let cipher = Aes256Gcm::new(cipher_key);
    let nonce = Nonce::from_slice(nonce);

    cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| VaultError::Corrupt("AES-256-GCM seal failed".to_string()))
}

/// Verify and decrypt `ciphertext_with_tag` with AES-256-GCM under `key`/`nonce`.
///
/// A failure here is reported as [`VaultError::BadPasswordOrCorrupt`] — by
/// design a wrong password and a tampered ciphertext are indistinguishable.
pub fn open(
    key: &Zeroizing<[u8; KEY_SIZE]>,
    nonce: &[u8; NONCE_SIZE],
    ciphertext_with_tag: &[u8],
) -> Result<Zeroizing<Vec<u8>>, VaultError> {
    if ciphertext_with_tag.len() < GCM_TAG_SIZE {
        return Err(VaultError::BadPasswordOrCorrupt);
    }

    let cipher_key = Key::<Aes256Gcm>::from_slice(key.as_ref());
    let cipher = Aes256Gcm::new(cipher_key);
    let nonce = Nonce::from_slice(nonce);

    let plaintext = cipher
        .decrypt(nonce, ciphertext_with_tag)
        .map_err(|_| VaultError::BadPasswordOrCorrupt)?;

    Ok(Zeroizing::new(plaintext))
}
