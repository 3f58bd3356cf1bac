// demos/main.rs
use std::path::PathBuf;

use flint_vault::{CancelFlag, Selector};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let vault_path = PathBuf::from("/tmp/flint-vault-demo.flint");
    if vault_path.exists() {
        std::fs::remove_file(&vault_path)?;
    }

    let password = b"correct-horse-battery-staple";

    flint_vault::create(&vault_path, password)?;
    println!("created empty vault at {}", vault_path.display());

    let scratch = tempfile::tempdir()?;
    std::fs::write(scratch.path().join("notes.txt"), b"hello\n")?;

    let report = flint_vault::add(
        &vault_path,
        password,
        &[scratch.path().join("notes.txt")],
        &flint_vault::AddOptions::default(),
        &CancelFlag::new(),
        None,
    )?;
    println!("added: {:?}, warnings: {:?}", report.added, report.warnings);

    for entry in flint_vault::list(&vault_path, password)? {
        println!("{:>8} bytes  {}", entry.size, entry.path);
    }

    let out_dir = scratch.path().join("out");
    let extract_report = flint_vault::extract(
        &vault_path,
        password,
        &out_dir,
        &Selector::All,
        &flint_vault::ExtractOptions::default(),
        &CancelFlag::new(),
        None,
    )?;
    for outcome in &extract_report.outcomes {
        println!("extracted {} (written={})", outcome.path, outcome.written);
    }

    let info = flint_vault::info(&vault_path)?;
    println!("version={} iterations={} ciphertext_length={}", info.version, info.kdf_iterations, info.ciphertext_length);

    // Wrong password should fail closed, never panic.
    match flint_vault::list(&vault_path, b"wrong-password") {
        Err(err) => println!("wrong password correctly rejected: {err}"),
        Ok(_) => unreachable!("wrong password must not decrypt"),
    }

    Ok(())
}
