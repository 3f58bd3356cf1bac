//! `add`: read host files into the model, hashing in parallel.

use std::fs;
use std::path::{Path, PathBuf};

use super::fsmeta::{mode_of, mtime_of, DEFAULT_DIR_MODE, DEFAULT_FILE_MODE};
use super::{require_password, AddOptions, AddReport};
use crate::error::VaultError;
use crate::model::{normalize_path, Entry};
use crate::parallel::{self, CancelFlag, ProgressFn};
use crate::vault;

/// One file queued for parallel read+hash.
struct AddJob {
    host_path: PathBuf,
    target_path: String,
    mode: u32,
    mtime_secs: i64,
    mtime_nanos: u32,
    size_hint: u64,
}

/// Add `sources` (files and/or directory trees) to the vault at `vault_path`.
///
/// Existing entries at the same normalized path are overwritten. The whole
/// call is all-or-nothing: any fatal error discards the in-memory model
/// without touching the file on disk.
pub fn add(
    vault_path: &Path,
    password: &[u8],
    sources: &[PathBuf],
    options: &AddOptions,
    cancel: &CancelFlag,
    progress: Option<&ProgressFn<'_>>,
) -> Result<AddReport, VaultError> {
    require_password(password)?;
    if sources.is_empty() {
        return Err(VaultError::InvalidArgument("no source paths given".to_string()));
    }

    let mut dir = vault::load(vault_path, password)?;

    let mut jobs = Vec::new();
    let mut dir_entries = Vec::new();
    let mut warnings = Vec::new();

    for source in sources {
        let meta = match classify(source, options.follow_symlinks, &mut warnings)? {
            Some(meta) => meta,
            None => continue,
        };

        let base_name = source
            .file_name()
            .ok_or_else(|| VaultError::InvalidArgument(format!("source has no file name: {}", source.display())))?
            .to_string_lossy()
            .into_owned();
        let target_root = match &options.target_prefix {
            Some(prefix) => format!("{prefix}/{base_name}"),
            None => base_name,
        };

        if meta.is_dir() {
            let normalized_root = normalize_path(&target_root)?;
            match walk_tree(source, &normalized_root, options, &mut warnings)? {
                WalkResult::Empty => {
                    let mode = if options.preserve_mode { mode_of(&meta) } else { DEFAULT_DIR_MODE };
                    let (secs, nanos) = mtime_of(&meta);
                    dir_entries.push(Entry::new_directory(normalized_root, mode, secs, nanos));
                }
                WalkResult::HasFiles { jobs: found_jobs, dirs: found_dirs } => {
                    jobs.extend(found_jobs);
                    dir_entries.extend(found_dirs);
                }
            }
        } else if meta.is_file() {
            let mode = if options.preserve_mode { mode_of(&meta) } else { DEFAULT_FILE_MODE };
            let (secs, nanos) = mtime_of(&meta);
            jobs.push(AddJob {
                host_path: source.clone(),
                target_path: normalize_path(&target_root)?,
                mode,
                mtime_secs: secs,
                mtime_nanos: nanos,
                size_hint: meta.len(),
            });
        } else {
            warnings.push(format!("skipped special file: {}", source.display()));
        }
    }

    let workers = parallel::resolve_worker_count(options.workers);
    let results = parallel::run_indexed(
        jobs,
        workers,
        cancel,
        progress,
        |job| job.target_path.clone(),
        |job| job.size_hint,
        |job| {
            let content = fs::read(&job.host_path)?;
            Ok(Entry::new_file(job.target_path.clone(), job.mode, job.mtime_secs, job.mtime_nanos, content))
        },
    );

    let mut added = Vec::with_capacity(results.len() + dir_entries.len());
    for result in results {
        let entry = result?;
        added.push(entry.path.clone());
        dir.insert_or_replace(entry);
    }
    for entry in dir_entries {
        added.push(entry.path.clone());
        dir.insert_or_replace(entry);
    }

    vault::store(vault_path, password, &dir)?;
    log::info!("add: {} entr{} written to {}", added.len(), if added.len() == 1 { "y" } else { "ies" }, vault_path.display());

    Ok(AddReport { added, warnings })
}

/// Classify a host path for `add`. Returns `None` (after recording a
/// warning) for a symlink when `follow_symlinks` is false, or for a broken
/// symlink even when it's true. Otherwise returns the metadata to act on —
/// the link's own metadata normally, or the target's metadata once
/// `follow_symlinks` opts into dereferencing it.
fn classify(path: &Path, follow_symlinks: bool, warnings: &mut Vec<String>) -> Result<Option<fs::Metadata>, VaultError> {
    let link_meta = fs::symlink_metadata(path)?;
    if !link_meta.file_type().is_symlink() {
        return Ok(Some(link_meta));
    }
    if !follow_symlinks {
        warnings.push(format!("skipped symlink: {}", path.display()));
        return Ok(None);
    }
    match fs::metadata(path) {
        Ok(followed) => Ok(Some(followed)),
        Err(_) => {
            warnings.push(format!("skipped broken symlink: {}", path.display()));
            Ok(None)
        }
    }
}

/// What a subtree walk found: either it's entirely file-free (`Empty`, in
/// which case the caller is responsible for emitting exactly one directory
/// entry for its root), or it has at least one file (`HasFiles`, carrying
/// every job and directory entry discovered so far so the caller can splice
/// them into its own accumulator).
enum WalkResult {
    Empty,
    HasFiles { jobs: Vec<AddJob>, dirs: Vec<Entry> },
}

/// Walk `root` on the host filesystem and classify its subtree.
///
/// A directory entry is emitted only for the topmost directory in a chain
/// that contains no files at all — `extract` recreates every ancestor via
/// `create_dir_all` when it materializes that one entry, so nested empty
/// directories need no entry of their own. This is why results bubble up
/// functionally instead of mutating a shared accumulator: a directory
/// whose entire subtree turns out empty discards
/// whatever its children tentatively collected and is represented by a
/// single entry at the level its caller decides on.
fn walk_tree(root: &Path, target_prefix: &str, options: &AddOptions, warnings: &mut Vec<String>) -> Result<WalkResult, VaultError> {
    let mut jobs = Vec::new();
    let mut dirs = Vec::new();
    let mut has_file = false;

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let child_target = format!("{target_prefix}/{name}");

        let meta = match classify(&path, options.follow_symlinks, warnings)? {
            Some(meta) => meta,
            None => continue,
        };

        if meta.is_dir() {
            let normalized_child = normalize_path(&child_target)?;
            match walk_tree(&path, &normalized_child, options, warnings)? {
                WalkResult::Empty => {
                    let mode = if options.preserve_mode { mode_of(&meta) } else { DEFAULT_DIR_MODE };
                    let (secs, nanos) = mtime_of(&meta);
                    dirs.push(Entry::new_directory(normalized_child, mode, secs, nanos));
                }
                WalkResult::HasFiles { jobs: found_jobs, dirs: found_dirs } => {
                    has_file = true;
                    jobs.extend(found_jobs);
                    dirs.extend(found_dirs);
                }
            }
        } else if meta.is_file() {
            has_file = true;
            let mode = if options.preserve_mode { mode_of(&meta) } else { DEFAULT_FILE_MODE };
            let (secs, nanos) = mtime_of(&meta);
            jobs.push(AddJob {
                host_path: path,
                target_path: normalize_path(&child_target)?,
                mode,
                mtime_secs: secs,
                mtime_nanos: nanos,
                size_hint: meta.len(),
            });
        } else {
            warnings.push(format!("skipped special file: {}", path.display()));
        }
    }

    if has_file {
        Ok(WalkResult::HasFiles { jobs, dirs })
    } else {
        Ok(WalkResult::Empty)
    }
}
