//! Public operation surface: `create`, `add`, `extract`, `list`, `remove`,
//! `info`. Each one is a self-contained read-transform-write cycle over
//! [`crate::vault`]; none of them retain state between calls.

mod add;
mod extract;
mod fsmeta;
mod remove;

use std::path::Path;

use crate::error::VaultError;
use crate::model::{Directory, EntryMeta};
use crate::vault;

pub use add::add;
pub use extract::extract;
pub use remove::{remove, RemoveReport};

/// Which entries an `extract` call selects.
#[derive(Debug, Clone)]
pub enum Selector {
    /// Every entry in the vault.
    All,
    /// Explicit entry paths; a directory path selects every entry nested
    /// under it (the "/"-boundary prefix rule).
    Paths(Vec<String>),
}

/// Per-call tuning for [`add`]. A plain `Options` struct with a `Default`
/// impl stands in for process-wide configuration, which this crate
/// deliberately has none of.
#[derive(Debug, Clone)]
pub struct AddOptions {
    /// Worker count for the parallel runner; `None` resolves to
    /// `min(2*CPU, 16)`.
    pub workers: Option<usize>,
    /// Copy each source's POSIX mode bits into the entry. When false, files
    /// get `0o644` and directories `0o755`.
    pub preserve_mode: bool,
    /// Follow symlinks encountered while walking a source tree. Default
    /// false — symlinks are always skipped with a warning regardless.
    pub follow_symlinks: bool,
    /// Prepend this path to every target path derived from a source's
    /// basename.
    pub target_prefix: Option<String>,
}

impl Default for AddOptions {
    fn default() -> Self {
        AddOptions {
            workers: None,
            preserve_mode: true,
            follow_symlinks: false,
            target_prefix: None,
        }
    }
}

/// Per-call tuning for [`extract`].
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Worker count for the parallel runner; `None` resolves to
    /// `min(2*CPU, 16)`.
    pub workers: Option<usize>,
    /// Discard directory structure and write every file directly under the
    /// output directory, using only its basename. Colliding basenames fail
    /// the whole call with [`VaultError::Collision`] before anything is
    /// written — this never silently overwrites.
    pub flatten: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions { workers: None, flatten: false }
    }
}

/// Outcome of an [`add`] call: the normalized paths actually written, plus a
/// warning for every source skipped as a symlink or special file.
#[derive(Debug, Clone, Default)]
pub struct AddReport {
    pub added: Vec<String>,
    pub warnings: Vec<String>,
}

/// Per-entry result of an [`extract`] call. A failed entry never aborts the
/// rest of the call — it shows up here instead.
#[derive(Debug, Clone)]
pub struct ExtractOutcome {
    pub path: String,
    pub written: bool,
    /// Set when writing bytes or verifying `sha256` failed for this entry.
    pub error: Option<String>,
    /// Set when the bytes were written but restoring mode/mtime failed —
    /// non-fatal.
    pub metadata_warning: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExtractReport {
    pub outcomes: Vec<ExtractOutcome>,
}

/// Outer-header-only diagnostic snapshot; no password required.
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    pub magic_valid: bool,
    pub version: u32,
    pub kdf_iterations: u32,
    pub salt_len: usize,
    pub nonce_len: usize,
    pub ciphertext_length: u64,
    pub file_size: u64,
}

/// Create a new, empty vault at `vault_path`.
///
/// Fails with [`VaultError::AlreadyExists`] if the path already exists —
/// `create` never overwrites silently.
pub fn create(vault_path: &Path, password: &[u8]) -> Result<(), VaultError> {
    require_password(password)?;
    if vault_path.exists() {
        return Err(VaultError::AlreadyExists);
    }
    vault::store(vault_path, password, &Directory::empty())
}

/// List every entry's metadata, in stored order, without reading content.
pub fn list(vault_path: &Path, password: &[u8]) -> Result<Vec<EntryMeta>, VaultError> {
    require_password(password)?;
    let dir = vault::load(vault_path, password)?;
    Ok(dir.entries().iter().map(|e| e.to_meta()).collect())
}

/// Read just the outer header — no password needed.
pub fn info(vault_path: &Path) -> Result<ContainerInfo, VaultError> {
    if !vault_path.exists() {
        return Err(VaultError::NotFound(vault_path.display().to_string()));
    }
    let raw = std::fs::read(vault_path)?;
    let probe = crate::format::probe_header(&raw)?;
    Ok(ContainerInfo {
        magic_valid: probe.magic_valid,
        version: probe.version,
        kdf_iterations: probe.kdf_iterations,
        salt_len: probe.salt_len,
        nonce_len: probe.nonce_len,
        ciphertext_length: probe.ciphertext_length,
        file_size: probe.file_size,
    })
}

pub(crate) fn require_password(password: &[u8]) -> Result<(), VaultError> {
    if password.is_empty() {
        return Err(VaultError::InvalidArgument("password must not be empty".to_string()));
    }
    Ok(())
}
