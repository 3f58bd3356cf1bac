//! The outer container: magic, version, KDF params, nonce, ciphertext length,
//! ciphertext. Atomic on-disk writes live here too.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::consts::{
    HEADER_SIZE, KDF_ITERATIONS_MAX, KDF_ITERATIONS_MIN, MAGIC, NONCE_SIZE, SALT_SIZE, VERSION,
};
use crate::error::VaultError;

/// Parsed outer header (everything but the ciphertext itself).
pub(crate) struct VaultHeader {
    pub version: u32,
    pub kdf_iterations: u32,
    pub salt: [u8; SALT_SIZE],
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext_length: u64,
}

/// Serialize `header` followed by `ciphertext` into the full byte image
/// written to disk.
pub(crate) fn encode(header: &VaultHeader, ciphertext: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&header.version.to_le_bytes());
    buf.extend_from_slice(&header.kdf_iterations.to_le_bytes());
    buf.extend_from_slice(&header.salt);
    buf.extend_from_slice(&header.nonce);
    buf.extend_from_slice(&header.ciphertext_length.to_le_bytes());
    buf.extend_from_slice(ciphertext);
    buf
}

/// Parse the byte-exact outer container layout. Returns `(header, ciphertext)`.
///
/// Validates magic, version, the KDF iteration range, and that the declared
/// `ciphertext_length` accounts for every remaining byte in `data` (no
/// trailing garbage, no truncation).
pub(crate) fn decode(data: &[u8]) -> Result<(VaultHeader, &[u8]), VaultError> {
    if data.len() < HEADER_SIZE {
        return Err(VaultError::Truncated);
    }

    if &data[0..8] != MAGIC {
        return Err(VaultError::NotAVault);
    }

    let mut o = 8;
    let version = u32::from_le_bytes(data[o..o + 4].try_into().unwrap());
    o += 4;
    if version != VERSION {
        return Err(VaultError::UnsupportedVersion(version));
    }

    let kdf_iterations = u32::from_le_bytes(data[o..o + 4].try_into().unwrap());
    o += 4;
    if !(KDF_ITERATIONS_MIN..=KDF_ITERATIONS_MAX).contains(&kdf_iterations) {
        return Err(VaultError::BadHeader(format!(
            "kdf iteration count {kdf_iterations} out of allowed range"
        )));
    }

    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&data[o..o + SALT_SIZE]);
    o += SALT_SIZE;

    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(&data[o..o + NONCE_SIZE]);
    o += NONCE_SIZE;

    let ciphertext_length = u64::from_le_bytes(data[o..o + 8].try_into().unwrap());
    o += 8;
    debug_assert_eq!(o, HEADER_SIZE);

    let remaining = (data.len() - HEADER_SIZE) as u64;
    if ciphertext_length > remaining {
        return Err(VaultError::BadHeader(format!(
            "declared ciphertext length {ciphertext_length} exceeds {remaining} bytes available"
        )));
    }
    if ciphertext_length < remaining {
        return Err(VaultError::Corrupt(format!(
            "{} trailing byte(s) beyond declared ciphertext length",
            remaining - ciphertext_length
        )));
    }

    let ciphertext = &data[HEADER_SIZE..];

    Ok((
        VaultHeader {
            version,
            kdf_iterations,
            salt,
            nonce,
            ciphertext_length,
        },
        ciphertext,
    ))
}

/// Read-only header inspection for [`crate::ops::info`], which needs no
/// password and tolerates an invalid magic (it reports `magic_valid` rather
/// than erroring, so a diagnostic tool can still see version/size fields for
/// a file that merely doesn't look like a vault).
pub(crate) struct HeaderProbe {
    pub magic_valid: bool,
    pub version: u32,
    pub kdf_iterations: u32,
    pub salt_len: usize,
    pub nonce_len: usize,
    pub ciphertext_length: u64,
    pub file_size: u64,
}

pub(crate) fn probe_header(data: &[u8]) -> Result<HeaderProbe, VaultError> {
    if data.len() < HEADER_SIZE {
        return Err(VaultError::Truncated);
    }

    let magic_valid = &data[0..8] == MAGIC;
    let mut o = 8;
    let version = u32::from_le_bytes(data[o..o + 4].try_into().unwrap());
    o += 4;
    let kdf_iterations = u32::from_le_bytes(data[o..o + 4].try_into().unwrap());
    o += 4 + SALT_SIZE + NONCE_SIZE;
    let ciphertext_length = u64::from_le_bytes(data[o..o + 8].try_into().unwrap());

    Ok(HeaderProbe {
        magic_valid,
        version,
        kdf_iterations,
        salt_len: SALT_SIZE,
        nonce_len: NONCE_SIZE,
        ciphertext_length,
        file_size: data.len() as u64,
    })
}

/// Write `data` to `path` atomically: build it in a temp sibling file,
/// `fsync`, then rename over the destination. On any error before the
/// rename the temp file is unlinked and `path` is untouched.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> Result<(), VaultError> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;

    tmp.persist(path).map_err(|e| VaultError::Io(e.error))?;

    if let Ok(dir) = File::open(parent) {
        let _ = dir.sync_all();
    }

    log::debug!("atomic write committed: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> VaultHeader {
        VaultHeader {
            version: VERSION,
            kdf_iterations: 100_000,
            salt: [7u8; SALT_SIZE],
            nonce: [9u8; NONCE_SIZE],
            ciphertext_length: 5,
        }
    }

    #[test]
    fn round_trip_header() {
        let header = sample_header();
        let encoded = encode(&header, b"hello");
        let (decoded, ciphertext) = decode(&encoded).unwrap();
        assert_eq!(decoded.version, VERSION);
        assert_eq!(decoded.kdf_iterations, 100_000);
        assert_eq!(decoded.salt, [7u8; SALT_SIZE]);
        assert_eq!(decoded.nonce, [9u8; NONCE_SIZE]);
        assert_eq!(ciphertext, b"hello");
    }

    #[test]
    fn rejects_bad_magic() {
        let header = sample_header();
        let mut encoded = encode(&header, b"hello");
        encoded[0] ^= 0xFF;
        assert!(matches!(decode(&encoded), Err(VaultError::NotAVault)));
    }

    #[test]
    fn rejects_wrong_version() {
        let header = sample_header();
        let mut encoded = encode(&header, b"hello");
        encoded[8] = 99;
        assert!(matches!(decode(&encoded), Err(VaultError::UnsupportedVersion(99))));
    }

    #[test]
    fn rejects_out_of_range_iterations() {
        let mut header = sample_header();
        header.kdf_iterations = 1;
        let encoded = encode(&header, b"hello");
        assert!(matches!(decode(&encoded), Err(VaultError::BadHeader(_))));
    }

    #[test]
    fn rejects_trailing_bytes() {
        let header = sample_header();
        let mut encoded = encode(&header, b"hello");
        encoded.push(0xAB);
        assert!(matches!(decode(&encoded), Err(VaultError::Corrupt(_))));
    }

    #[test]
    fn rejects_truncated_file() {
        assert!(matches!(decode(&[0u8; 10]), Err(VaultError::Truncated)));
    }
}
