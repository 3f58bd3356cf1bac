use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::consts::{KDF_ITERATIONS_MAX, KDF_ITERATIONS_MIN, SALT_SIZE};
use crate::error::VaultError;

/// Output key size in bytes. 32 bytes = 256-bit key for AES-256-GCM.
pub const KEY_SIZE: usize = 32;

/// Derive a 256-bit AES key from a password and salt using PBKDF2-HMAC-SHA256.
///
/// `iterations` must fall within `[KDF_ITERATIONS_MIN, KDF_ITERATIONS_MAX]`;
/// a value outside that range is treated as a corrupt or hostile header and
/// rejected before any CPU time is spent on it.
pub fn derive_key(
    password: &[u8],
    salt: &[u8; SALT_SIZE],
    iterations: u32,
) -> Result<Zeroizing<[u8; KEY_SIZE]>, VaultError> {
    if !(KDF_ITERATIONS_MIN..=KDF_ITERATIONS_MAX).contains(&iterations) {
        return Err(VaultError::BadHeader(format!(
            "kdf iteration count {iterations} out of allowed range [{KDF_ITERATIONS_MIN}, {KDF_ITERATIONS_MAX}]"
        )));
    }

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2_hmac::<Sha256>(password, salt, iterations, key.as_mut());
    Ok(key)
}
