//! `remove`: delete entries matching a set of target paths.

use std::path::Path;

use super::require_password;
use crate::error::VaultError;
use crate::model::normalize_path;
use crate::vault;

/// Paths actually removed by a [`remove`] call, in no particular order.
#[derive(Debug, Clone, Default)]
pub struct RemoveReport {
    pub removed: Vec<String>,
}

/// Remove every entry matching any of `targets` (exact path for a file,
/// prefix match for a directory) from the vault at `vault_path`.
///
/// If any target matches nothing, the call fails with
/// [`VaultError::NotFound`] and the vault is left untouched — there is no
/// partial removal.
pub fn remove(vault_path: &Path, password: &[u8], targets: &[String]) -> Result<RemoveReport, VaultError> {
    require_password(password)?;
    if targets.is_empty() {
        return Err(VaultError::InvalidArgument("no targets given".to_string()));
    }

    let mut dir = vault::load(vault_path, password)?;

    let normalized: Vec<String> = targets.iter().map(|t| normalize_path(t)).collect::<Result<_, _>>()?;

    for target in &normalized {
        if dir.select_matching(target).is_empty() {
            return Err(VaultError::NotFound(target.clone()));
        }
    }

    let mut removed = Vec::new();
    for target in &normalized {
        for entry in dir.remove_matching(target) {
            removed.push(entry.path);
        }
    }

    vault::store(vault_path, password, &dir)?;
    log::info!("remove: {} entr{} removed from {}", removed.len(), if removed.len() == 1 { "y" } else { "ies" }, vault_path.display());

    Ok(RemoveReport { removed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Directory, Entry};
    use tempfile::tempdir;

    fn seeded(path: &Path) {
        let mut dir = Directory::empty();
        dir.insert_or_replace(Entry::new_file("docs/a.txt".into(), 0o644, 0, 0, b"a".to_vec()));
        dir.insert_or_replace(Entry::new_file("docs/b.txt".into(), 0o644, 0, 0, b"b".to_vec()));
        dir.insert_or_replace(Entry::new_file("notes.txt".into(), 0o644, 0, 0, b"n".to_vec()));
        vault::store(path, b"pw", &dir).unwrap();
    }

    #[test]
    fn idempotent_remove_fails_second_call() {
        let scratch = tempdir().unwrap();
        let path = scratch.path().join("v.flint");
        seeded(&path);

        let report = remove(&path, b"pw", &["docs".to_string()]).unwrap();
        assert_eq!(report.removed.len(), 2);

        let snapshot = std::fs::read(&path).unwrap();
        let err = remove(&path, b"pw", &["docs".to_string()]).unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
        assert_eq!(std::fs::read(&path).unwrap(), snapshot);
    }

    #[test]
    fn missing_target_aborts_without_partial_removal() {
        let scratch = tempdir().unwrap();
        let path = scratch.path().join("v.flint");
        seeded(&path);

        let before = std::fs::read(&path).unwrap();
        let err = remove(&path, b"pw", &["notes.txt".to_string(), "nope".to_string()]).unwrap_err();
        assert!(matches!(err, VaultError::NotFound(_)));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }
}
