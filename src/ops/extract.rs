//! `extract`: write selected entries out to the host filesystem, in
//! parallel, restoring mode and mtime best-effort.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::fsmeta::system_time_from;
use super::{require_password, ExtractOptions, ExtractOutcome, ExtractReport, Selector};
use crate::error::VaultError;
use crate::model::{normalize_path, sha256_of, Entry, Kind};
use crate::parallel::{self, CancelFlag, ProgressFn};
use crate::vault;

struct WriteJob<'a> {
    entry: &'a Entry,
    dest: PathBuf,
}

/// Extract `selector`'s entries from the vault at `vault_path` into
/// `output_dir`.
///
/// A structural problem (bad selector, flatten-mode collision, I/O setting
/// up `output_dir`) fails the whole call before any bytes are written. Once
/// writing starts, a failure on one entry is recorded in the returned
/// report rather than aborting the rest.
pub fn extract(
    vault_path: &Path,
    password: &[u8],
    output_dir: &Path,
    selector: &Selector,
    options: &ExtractOptions,
    cancel: &CancelFlag,
    progress: Option<&ProgressFn<'_>>,
) -> Result<ExtractReport, VaultError> {
    require_password(password)?;

    let dir = vault::load(vault_path, password)?;

    let selected: Vec<&Entry> = match selector {
        Selector::All => dir.entries().iter().collect(),
        Selector::Paths(targets) => {
            if targets.is_empty() {
                return Err(VaultError::InvalidArgument("no selector paths given".to_string()));
            }
            let mut out = Vec::new();
            for raw in targets {
                let target = normalize_path(raw)?;
                let matches = dir.select_matching(&target);
                if matches.is_empty() {
                    return Err(VaultError::NotFound(target));
                }
                out.extend(matches);
            }
            out
        }
    };

    let file_entries: Vec<&Entry> = selected.iter().copied().filter(|e| e.kind == Kind::File).collect();
    let directory_entries: Vec<&Entry> = selected.iter().copied().filter(|e| e.kind == Kind::Directory).collect();

    if options.flatten {
        let mut seen = HashSet::new();
        for entry in &file_entries {
            let name = basename_of(&entry.path);
            if !seen.insert(name.clone()) {
                return Err(VaultError::Collision(name));
            }
        }
    }

    fs::create_dir_all(output_dir)?;

    let mut outcomes = Vec::with_capacity(selected.len());

    if !options.flatten {
        for entry in &directory_entries {
            fs::create_dir_all(output_dir.join(&entry.path))?;
            outcomes.push(ExtractOutcome {
                path: entry.path.clone(),
                written: true,
                error: None,
                metadata_warning: None,
            });
        }
    }

    let jobs: Vec<WriteJob> = file_entries
        .iter()
        .map(|entry| {
            let dest = if options.flatten {
                output_dir.join(basename_of(&entry.path))
            } else {
                output_dir.join(&entry.path)
            };
            WriteJob { entry, dest }
        })
        .collect();

    let workers = parallel::resolve_worker_count(options.workers);
    let results = parallel::run_indexed(
        jobs,
        workers,
        cancel,
        progress,
        |job| job.entry.path.clone(),
        |job| job.entry.size,
        |job| write_entry(job.entry, &job.dest),
    );

    for (entry, result) in file_entries.iter().zip(results.into_iter()) {
        outcomes.push(match result {
            Ok(outcome) => outcome,
            Err(err) => ExtractOutcome {
                path: entry.path.clone(),
                written: false,
                error: Some(err.to_string()),
                metadata_warning: None,
            },
        });
    }

    log::info!(
        "extract: {}/{} entries written from {} to {}",
        outcomes.iter().filter(|o| o.written).count(),
        outcomes.len(),
        vault_path.display(),
        output_dir.display()
    );

    Ok(ExtractReport { outcomes })
}

fn basename_of(path: &str) -> String {
    Path::new(path).file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| path.to_string())
}

fn write_entry(entry: &Entry, dest: &Path) -> Result<ExtractOutcome, VaultError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, &entry.content)?;

    if sha256_of(&entry.content) != entry.sha256 {
        return Err(VaultError::Corrupt(format!("sha256 mismatch after writing {}", entry.path)));
    }

    let metadata_warning = restore_metadata(dest, entry).err().map(|e| e.to_string());

    Ok(ExtractOutcome {
        path: entry.path.clone(),
        written: true,
        error: None,
        metadata_warning,
    })
}

#[cfg(unix)]
fn restore_metadata(path: &Path, entry: &Entry) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(entry.mode))?;
    set_mtime(path, entry)
}

#[cfg(not(unix))]
fn restore_metadata(path: &Path, entry: &Entry) -> std::io::Result<()> {
    set_mtime(path, entry)
}

fn set_mtime(path: &Path, entry: &Entry) -> std::io::Result<()> {
    let mtime = system_time_from(entry.mtime_secs, entry.mtime_nanos);
    let times = fs::FileTimes::new().set_modified(mtime);
    let file = fs::OpenOptions::new().write(true).open(path)?;
    file.set_times(times)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{add, create, remove, AddOptions};
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(path: &Path, content: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut f = fs::File::create(path).unwrap();
        f.write_all(content).unwrap();
    }

    fn seeded_vault() -> (tempfile::TempDir, PathBuf) {
        let scratch = tempdir().unwrap();
        let vault_path = scratch.path().join("v.flint");
        create(&vault_path, b"pw").unwrap();

        let sources = tempdir().unwrap();
        let tree_root = sources.path().join("a");
        write_file(&tree_root.join("x.bin"), &[0u8; 1024]);
        write_file(&tree_root.join("b").join("y.bin"), &[0xFFu8; 1024]);

        add(&vault_path, b"pw", &[tree_root], &AddOptions::default(), &CancelFlag::new(), None).unwrap();
        (scratch, vault_path)
    }

    #[test]
    fn s2_extract_reproduces_file_byte_for_byte() {
        let scratch = tempdir().unwrap();
        let vault_path = scratch.path().join("v.flint");
        create(&vault_path, b"pw").unwrap();

        let sources = tempdir().unwrap();
        let greet = sources.path().join("greet.txt");
        write_file(&greet, b"hello\n");
        add(&vault_path, b"pw", &[greet], &AddOptions::default(), &CancelFlag::new(), None).unwrap();

        let out = tempdir().unwrap();
        let report = extract(&vault_path, b"pw", out.path(), &Selector::All, &ExtractOptions::default(), &CancelFlag::new(), None).unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert!(report.outcomes[0].written);
        assert_eq!(fs::read(out.path().join("greet.txt")).unwrap(), b"hello\n");
    }

    #[test]
    fn s3_flatten_places_files_side_by_side() {
        let (_scratch, vault_path) = seeded_vault();
        let out = tempdir().unwrap();

        let opts = ExtractOptions { workers: None, flatten: true };
        extract(&vault_path, b"pw", out.path(), &Selector::All, &opts, &CancelFlag::new(), None).unwrap();

        assert!(out.path().join("x.bin").exists());
        assert!(out.path().join("y.bin").exists());
        assert!(!out.path().join("a").exists());
    }

    #[test]
    fn s3_non_flatten_preserves_tree() {
        let (_scratch, vault_path) = seeded_vault();
        let out = tempdir().unwrap();

        extract(&vault_path, b"pw", out.path(), &Selector::All, &ExtractOptions::default(), &CancelFlag::new(), None).unwrap();

        assert!(out.path().join("a/x.bin").exists());
        assert!(out.path().join("a/b/y.bin").exists());
    }

    #[test]
    fn flatten_collision_fails_before_writing_anything() {
        let scratch = tempdir().unwrap();
        let vault_path = scratch.path().join("v.flint");
        create(&vault_path, b"pw").unwrap();

        let sources = tempdir().unwrap();
        write_file(&sources.path().join("a").join("dup.txt"), b"one");
        write_file(&sources.path().join("b").join("dup.txt"), b"two");
        add(
            &vault_path,
            b"pw",
            &[sources.path().join("a"), sources.path().join("b")],
            &AddOptions::default(),
            &CancelFlag::new(),
            None,
        )
        .unwrap();

        let out = tempdir().unwrap();
        let opts = ExtractOptions { workers: None, flatten: true };
        let err = extract(&vault_path, b"pw", out.path(), &Selector::All, &opts, &CancelFlag::new(), None).unwrap_err();

        assert!(matches!(err, VaultError::Collision(_)));
        assert!(fs::read_dir(out.path()).unwrap().next().is_none());
    }

    #[test]
    fn s6_selective_remove_then_extract() {
        let scratch = tempdir().unwrap();
        let vault_path = scratch.path().join("v.flint");
        create(&vault_path, b"pw").unwrap();

        let sources = tempdir().unwrap();
        write_file(&sources.path().join("docs").join("a.txt"), b"a");
        write_file(&sources.path().join("docs").join("b.txt"), b"b");
        write_file(&sources.path().join("notes.txt"), b"n");
        add(
            &vault_path,
            b"pw",
            &[sources.path().join("docs"), sources.path().join("notes.txt")],
            &AddOptions::default(),
            &CancelFlag::new(),
            None,
        )
        .unwrap();

        remove(&vault_path, b"pw", &["docs".to_string()]).unwrap();
        let entries = crate::ops::list(&vault_path, b"pw").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "notes.txt");

        let err = remove(&vault_path, b"pw", &["docs".to_string()]).unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }

    #[test]
    fn selector_matching_nothing_is_not_found() {
        let (_scratch, vault_path) = seeded_vault();
        let out = tempdir().unwrap();
        let selector = Selector::Paths(vec!["does/not/exist".to_string()]);
        let err = extract(&vault_path, b"pw", out.path(), &selector, &ExtractOptions::default(), &CancelFlag::new(), None).unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
    }
}
