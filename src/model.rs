//! The in-memory directory model and path normalization.

use sha2::{Digest as _, Sha256};

use crate::consts::{MAX_PATH_LEN, MAX_SEGMENT_LEN};
use crate::error::VaultError;

/// Whether an [`Entry`] is a regular file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    File,
    Directory,
}

/// One file or directory stored inside a vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: String,
    pub kind: Kind,
    pub mode: u32,
    pub mtime_secs: i64,
    pub mtime_nanos: u32,
    pub size: u64,
    pub content: Vec<u8>,
    pub sha256: [u8; 32],
}

impl Entry {
    /// Build a `FILE` entry, computing `size` and `sha256` from `content`.
    pub fn new_file(path: String, mode: u32, mtime_secs: i64, mtime_nanos: u32, content: Vec<u8>) -> Self {
        let sha256 = sha256_of(&content);
        Entry {
            path,
            kind: Kind::File,
            mode,
            mtime_secs,
            mtime_nanos,
            size: content.len() as u64,
            content,
            sha256,
        }
    }

    /// Build a `DIRECTORY` entry. `size` is 0 and `sha256` is all-zero.
    pub fn new_directory(path: String, mode: u32, mtime_secs: i64, mtime_nanos: u32) -> Self {
        Entry {
            path,
            kind: Kind::Directory,
            mode,
            mtime_secs,
            mtime_nanos,
            size: 0,
            content: Vec::new(),
            sha256: [0u8; 32],
        }
    }

    /// Recompute and compare `sha256` against `content`.
    pub fn hash_matches(&self) -> bool {
        match self.kind {
            Kind::Directory => self.sha256 == [0u8; 32] && self.content.is_empty(),
            Kind::File => self.sha256 == sha256_of(&self.content),
        }
    }

    pub fn to_meta(&self) -> EntryMeta {
        EntryMeta {
            path: self.path.clone(),
            kind: self.kind,
            mode: self.mode,
            mtime_secs: self.mtime_secs,
            mtime_nanos: self.mtime_nanos,
            size: self.size,
        }
    }
}

/// `Entry` without file content — what `list` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta {
    pub path: String,
    pub kind: Kind,
    pub mode: u32,
    pub mtime_secs: i64,
    pub mtime_nanos: u32,
    pub size: u64,
}

pub(crate) fn sha256_of(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Normalize a path: absolute paths, NUL bytes, `.`/`..` segments, and
/// over-length paths/segments are rejected; repeated separators are
/// collapsed; native separators become `/`; a single trailing `/` is
/// stripped.
pub fn normalize_path(raw: &str) -> Result<String, VaultError> {
    if raw.is_empty() {
        return Err(VaultError::InvalidArgument("path must not be empty".to_string()));
    }
    if raw.contains('\0') {
        return Err(VaultError::InvalidArgument("path must not contain NUL bytes".to_string()));
    }

    let unified: String = raw.chars().map(|c| if c == '\\' { '/' } else { c }).collect();

    if unified.starts_with('/') {
        return Err(VaultError::InvalidArgument(format!("path must not be absolute: {raw}")));
    }
    // Windows-style drive-letter absolute paths ("C:/...").
    if unified.len() >= 2 && unified.as_bytes()[1] == b':' {
        return Err(VaultError::InvalidArgument(format!("path must not be absolute: {raw}")));
    }

    let stripped = unified.strip_suffix('/').unwrap_or(&unified);

    let mut segments: Vec<&str> = Vec::new();
    for segment in stripped.split('/') {
        if segment.is_empty() {
            // repeated separators collapse away
            continue;
        }
        if segment == "." || segment == ".." {
            return Err(VaultError::InvalidArgument(format!(
                "path must not contain '.' or '..' segments: {raw}"
            )));
        }
        if segment.len() > MAX_SEGMENT_LEN {
            return Err(VaultError::InvalidArgument(format!(
                "path segment exceeds {MAX_SEGMENT_LEN} bytes: {segment}"
            )));
        }
        segments.push(segment);
    }

    if segments.is_empty() {
        return Err(VaultError::InvalidArgument("path must not be empty".to_string()));
    }

    let normalized = segments.join("/");
    if normalized.len() > MAX_PATH_LEN {
        return Err(VaultError::InvalidArgument(format!(
            "path exceeds {MAX_PATH_LEN} bytes: {normalized}"
        )));
    }

    Ok(normalized)
}

/// Whether `prefix` selects `path` under the "/"-boundary rule: exact
/// match, or `path` starts with `prefix` followed by `/`.
pub fn path_matches_prefix(path: &str, prefix: &str) -> bool {
    path == prefix || path.starts_with(&format!("{prefix}/"))
}

/// The in-memory directory: an ordered, path-unique sequence of entries.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    entries: Vec<Entry>,
}

impl Directory {
    pub fn empty() -> Self {
        Directory { entries: Vec::new() }
    }

    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Directory { entries }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, path: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Insert `entry`, replacing any existing entry with the same path
    /// in place (preserving its position) so stored order stays stable for
    /// everything else.
    pub fn insert_or_replace(&mut self, entry: Entry) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.path == entry.path) {
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    /// Remove every entry matching `target` under the prefix rule.
    /// Returns the removed entries (empty if nothing matched).
    pub fn remove_matching(&mut self, target: &str) -> Vec<Entry> {
        let (removed, kept): (Vec<Entry>, Vec<Entry>) =
            self.entries.drain(..).partition(|e| path_matches_prefix(&e.path, target));
        self.entries = kept;
        removed
    }

    /// All entries whose path matches `target` under the prefix rule,
    /// without mutating the directory.
    pub fn select_matching(&self, target: &str) -> Vec<&Entry> {
        self.entries.iter().filter(|e| path_matches_prefix(&e.path, target)).collect()
    }
}
