use assert_cmd::cargo;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn write_cfg(path: &Path, store: &Path) {
    let yaml = format!(
        "backup_root: \"{}\"\nlog_level: quiet\nlog_file: \"\"\n",
        store.display()
    );
    fs::write(path, yaml).unwrap();
}

fn linkstash(cfg: &Path) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("linkstash"));
    cmd.arg("--config").arg(cfg);
    cmd
}

/// --dry-run walks the whole pipeline but leaves the filesystem alone.
#[test]
fn dry_run_install_moves_nothing() {
    let td = tempdir().unwrap();
    let base = fs::canonicalize(td.path()).unwrap();
    let cfg = base.join("config.yaml");
    let store = base.join("store");
    write_cfg(&cfg, &store);

    let source = base.join("Fonts");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("a.ttf"), "glyphs").unwrap();

    let out = linkstash(&cfg)
        .args(["add", "Fonts", "--from"])
        .arg(&source)
        .output()
        .expect("spawn add");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let out = linkstash(&cfg)
        .args(["--dry-run", "install", "Fonts"])
        .output()
        .expect("spawn install");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("dry run: would relocate"), "{stdout}");

    assert!(!fs::symlink_metadata(&source).unwrap().file_type().is_symlink());
    assert!(source.join("a.ttf").exists());
    assert!(!store.join("Fonts").exists(), "nothing may appear in the store");
}

/// A dry-run add reports the spec but does not write the store document.
#[test]
fn dry_run_add_leaves_the_store_document_alone() {
    let td = tempdir().unwrap();
    let base = fs::canonicalize(td.path()).unwrap();
    let cfg = base.join("config.yaml");
    let store = base.join("store");
    write_cfg(&cfg, &store);

    let out = linkstash(&cfg)
        .args(["--dry-run", "add", "Zsh", "--from", "~/.zshrc"])
        .output()
        .expect("spawn add");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    // A follow-up listing shows no stored links.
    let out = linkstash(&cfg).arg("status").output().expect("spawn status");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("No links configured yet"), "{stdout}");
}
