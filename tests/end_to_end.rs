//! End-to-end scenarios and cross-cutting invariants, exercised through the
//! public API only.

use std::fs;
use std::io::Write;
use std::path::Path;

use flint_vault::{add, create, extract, info, list, remove, AddOptions, CancelFlag, ExtractOptions, Selector, VaultError};

fn write_file(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::File::create(path).unwrap().write_all(content).unwrap();
}

#[test]
fn s1_empty_vault() {
    let scratch = tempfile::tempdir().unwrap();
    let vault_path = scratch.path().join("v.flint");

    create(&vault_path, b"pw").unwrap();

    assert!(list(&vault_path, b"pw").unwrap().is_empty());

    let probe = info(&vault_path).unwrap();
    assert_eq!(probe.version, 1);
    assert_eq!(probe.kdf_iterations, 100_000);
    assert_eq!(probe.salt_len, 32);
    assert_eq!(probe.nonce_len, 12);
}

#[test]
fn s2_one_small_file() {
    let scratch = tempfile::tempdir().unwrap();
    let vault_path = scratch.path().join("v.flint");
    create(&vault_path, b"pw").unwrap();

    let sources = tempfile::tempdir().unwrap();
    let greet = sources.path().join("greet.txt");
    write_file(&greet, b"hello\n");

    add(&vault_path, b"pw", &[greet], &AddOptions::default(), &CancelFlag::new(), None).unwrap();

    let entries = list(&vault_path, b"pw").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, "greet.txt");
    assert_eq!(entries[0].size, 6);

    let out = tempfile::tempdir().unwrap();
    extract(&vault_path, b"pw", out.path(), &Selector::All, &ExtractOptions::default(), &CancelFlag::new(), None).unwrap();
    assert_eq!(fs::read(out.path().join("greet.txt")).unwrap(), b"hello\n");
}

fn seed_tree(vault_path: &Path) {
    create(vault_path, b"pw").unwrap();
    let sources = tempfile::tempdir().unwrap();
    let root = sources.path().join("a");
    write_file(&root.join("x.bin"), &[0u8; 1024]);
    write_file(&root.join("b").join("y.bin"), &[0xFFu8; 1024]);
    add(vault_path, b"pw", &[root], &AddOptions::default(), &CancelFlag::new(), None).unwrap();
}

#[test]
fn s3_directory_tree_flatten_and_preserve() {
    let scratch = tempfile::tempdir().unwrap();
    let vault_path = scratch.path().join("v.flint");
    seed_tree(&vault_path);

    let entries = list(&vault_path, b"pw").unwrap();
    let paths: Vec<_> = entries.iter().map(|e| e.path.clone()).collect();
    assert!(paths.contains(&"a/x.bin".to_string()));
    assert!(paths.contains(&"a/b/y.bin".to_string()));

    let flat_out = tempfile::tempdir().unwrap();
    let opts = ExtractOptions { workers: None, flatten: true };
    extract(&vault_path, b"pw", flat_out.path(), &Selector::All, &opts, &CancelFlag::new(), None).unwrap();
    assert!(flat_out.path().join("x.bin").exists());
    assert!(flat_out.path().join("y.bin").exists());

    let tree_out = tempfile::tempdir().unwrap();
    extract(&vault_path, b"pw", tree_out.path(), &Selector::All, &ExtractOptions::default(), &CancelFlag::new(), None).unwrap();
    assert!(tree_out.path().join("a/x.bin").exists());
    assert!(tree_out.path().join("a/b/y.bin").exists());
}

#[test]
fn s4_wrong_password_leaves_file_untouched() {
    let scratch = tempfile::tempdir().unwrap();
    let vault_path = scratch.path().join("v.flint");
    create(&vault_path, b"right").unwrap();

    let before = fs::read(&vault_path).unwrap();
    let err = list(&vault_path, b"wrong").unwrap_err();
    assert!(matches!(err, VaultError::BadPasswordOrCorrupt));
    assert_eq!(fs::read(&vault_path).unwrap(), before);
}

#[test]
fn s5_tamper_ciphertext_fails_closed() {
    let scratch = tempfile::tempdir().unwrap();
    let vault_path = scratch.path().join("v.flint");
    create(&vault_path, b"pw").unwrap();

    let mut raw = fs::read(&vault_path).unwrap();
    let last = raw.len() - 1;
    raw[last] ^= 0xFF;
    fs::write(&vault_path, &raw).unwrap();

    let err = list(&vault_path, b"pw").unwrap_err();
    assert!(matches!(err, VaultError::BadPasswordOrCorrupt));
}

#[test]
fn s6_selective_remove_then_idempotent_second_call() {
    let scratch = tempfile::tempdir().unwrap();
    let vault_path = scratch.path().join("v.flint");
    create(&vault_path, b"pw").unwrap();

    let sources = tempfile::tempdir().unwrap();
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
    let entries = list(&vault_path, b"pw").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, "notes.txt");

    let err = remove(&vault_path, b"pw", &["docs".to_string()]).unwrap_err();
    assert!(matches!(err, VaultError::NotFound(_)));
}

/// Invariant 2: same model, different password, same outer header shape,
/// different salt/nonce/ciphertext.
#[test]
fn invariant_header_shape_stable_across_passwords() {
    let scratch = tempfile::tempdir().unwrap();
    let path_a = scratch.path().join("a.flint");
    let path_b = scratch.path().join("b.flint");

    create(&path_a, b"password-one").unwrap();
    create(&path_b, b"password-two").unwrap();

    let raw_a = fs::read(&path_a).unwrap();
    let raw_b = fs::read(&path_b).unwrap();

    assert_eq!(raw_a.len(), raw_b.len());
    assert_ne!(raw_a[16..48], raw_b[16..48], "salts must differ");
    assert_ne!(raw_a[48..60], raw_b[48..60], "nonces must differ");
    assert_ne!(raw_a[68..], raw_b[68..], "ciphertext must differ");
}

/// Invariant 4: wrong password and bit-flipped ciphertext produce the same
/// error kind.
#[test]
fn invariant_wrong_password_indistinguishable_from_tamper() {
    let scratch = tempfile::tempdir().unwrap();
    let path_wrong = scratch.path().join("wrong.flint");
    let path_tampered = scratch.path().join("tampered.flint");

    create(&path_wrong, b"right").unwrap();
    fs::copy(&path_wrong, &path_tampered).unwrap();

    let mut raw = fs::read(&path_tampered).unwrap();
    let last = raw.len() - 1;
    raw[last] ^= 0x01;
    fs::write(&path_tampered, &raw).unwrap();

    let err_wrong_password = list(&path_wrong, b"wrong").unwrap_err();
    let err_tampered = list(&path_tampered, b"right").unwrap_err();

    assert!(matches!(err_wrong_password, VaultError::BadPasswordOrCorrupt));
    assert!(matches!(err_tampered, VaultError::BadPasswordOrCorrupt));
}

/// Invariant 5: malformed paths fail with InvalidArgument before the vault
/// file is touched.
#[test]
fn invariant_bad_path_rejected_before_write() {
    let scratch = tempfile::tempdir().unwrap();
    let vault_path = scratch.path().join("v.flint");
    create(&vault_path, b"pw").unwrap();
    let before = fs::read(&vault_path).unwrap();

    let err = remove(&vault_path, b"pw", &["../escape".to_string()]).unwrap_err();
    assert!(matches!(err, VaultError::InvalidArgument(_)));
    assert_eq!(fs::read(&vault_path).unwrap(), before);
}

/// Invariant 7: any worker count in [1, 16] yields the same decrypted model.
#[test]
fn invariant_parallel_determinism_across_worker_counts() {
    let sources = tempfile::tempdir().unwrap();
    let mut files = Vec::new();
    for i in 0..20 {
        let path = sources.path().join(format!("f{i}.bin"));
        write_file(&path, &vec![i as u8; 100]);
        files.push(path);
    }

    let mut reference: Option<Vec<(String, u64, [u8; 32])>> = None;
    for workers in [1usize, 4, 16] {
        let scratch = tempfile::tempdir().unwrap();
        let vault_path = scratch.path().join("v.flint");
        create(&vault_path, b"pw").unwrap();

        let opts = AddOptions { workers: Some(workers), ..AddOptions::default() };
        add(&vault_path, b"pw", &files, &opts, &CancelFlag::new(), None).unwrap();

        let entries = list(&vault_path, b"pw").unwrap();
        let mut snapshot: Vec<(String, u64, [u8; 32])> =
            entries.iter().map(|e| (e.path.clone(), e.size, [0u8; 32])).collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));

        match &reference {
            None => reference = Some(snapshot),
            Some(expected) => assert_eq!(&snapshot, expected, "worker count {workers} diverged"),
        }
    }
}

/// Invariant 9, restated end-to-end at the crate boundary: removing a
/// target twice is rejected, not silently accepted, the second time.
#[test]
fn invariant_idempotent_remove_leaves_vault_unchanged() {
    let scratch = tempfile::tempdir().unwrap();
    let vault_path = scratch.path().join("v.flint");
    create(&vault_path, b"pw").unwrap();

    let sources = tempfile::tempdir().unwrap();
    let f = sources.path().join("f.txt");
    write_file(&f, b"data");
    add(&vault_path, b"pw", &[f], &AddOptions::default(), &CancelFlag::new(), None).unwrap();

    remove(&vault_path, b"pw", &["f.txt".to_string()]).unwrap();
    let snapshot = fs::read(&vault_path).unwrap();

    let err = remove(&vault_path, b"pw", &["f.txt".to_string()]).unwrap_err();
    assert!(matches!(err, VaultError::NotFound(_)));
    assert_eq!(fs::read(&vault_path).unwrap(), snapshot);
}

#[test]
fn create_refuses_to_overwrite_existing_vault() {
    let scratch = tempfile::tempdir().unwrap();
    let vault_path = scratch.path().join("v.flint");
    create(&vault_path, b"pw").unwrap();

    let err = create(&vault_path, b"pw2").unwrap_err();
    assert!(matches!(err, VaultError::AlreadyExists));
}

#[test]
fn info_never_needs_a_password() {
    let scratch = tempfile::tempdir().unwrap();
    let vault_path = scratch.path().join("v.flint");
    create(&vault_path, b"pw").unwrap();

    let probe = info(&vault_path).unwrap();
    assert!(probe.magic_valid);
    assert!(probe.file_size > 0);
}
