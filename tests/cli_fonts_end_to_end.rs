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

/// The full lifecycle through the binary: add a link for a real directory,
/// install it, list it, uninstall it. Content ends up in the store and the
/// backup survives the uninstall.
#[test]
fn add_install_status_uninstall() {
    let td = tempdir().unwrap();
    let base = fs::canonicalize(td.path()).unwrap();
    let cfg = base.join("config.yaml");
    let store = base.join("store");
    write_cfg(&cfg, &store);

    let fonts = base.join("Fonts");
    fs::create_dir_all(&fonts).unwrap();
    fs::write(fonts.join("Inter.ttf"), "glyphs").unwrap();

    let out = linkstash(&cfg)
        .args(["add", "Fonts", "--from"])
        .arg(&fonts)
        .output()
        .expect("spawn add");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let out = linkstash(&cfg)
        .args(["install", "Fonts"])
        .output()
        .expect("spawn install");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    // Content relocated, link in place.
    let slot = store.join("Fonts");
    assert_eq!(fs::read_to_string(slot.join("Inter.ttf")).unwrap(), "glyphs");
    assert!(fs::symlink_metadata(&fonts).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_link(&fonts).unwrap(), slot);

    let out = linkstash(&cfg)
        .args(["status", "--paths"])
        .output()
        .expect("spawn status");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Fonts") && stdout.contains("[installed]"), "{stdout}");
    assert!(stdout.contains(&slot.display().to_string()), "{stdout}");

    let out = linkstash(&cfg)
        .args(["uninstall", "Fonts"])
        .output()
        .expect("spawn uninstall");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(fs::symlink_metadata(&fonts).is_err(), "link should be gone");
    assert_eq!(
        fs::read_to_string(slot.join("Inter.ttf")).unwrap(),
        "glyphs",
        "uninstall must leave the backup alone"
    );
}

/// Naming a link that is not in the store fails with the usage exit code
/// and does not touch the filesystem.
#[test]
fn install_unknown_name_fails() {
    let td = tempdir().unwrap();
    let base = fs::canonicalize(td.path()).unwrap();
    let cfg = base.join("config.yaml");
    write_cfg(&cfg, &base.join("store"));

    let out = linkstash(&cfg)
        .args(["install", "Nope"])
        .output()
        .expect("spawn install");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("no link named 'Nope'"), "{stderr}");
}

/// `install` with no names and no --all is a usage error, not a silent
/// no-op.
#[test]
fn install_without_selection_is_rejected() {
    let td = tempdir().unwrap();
    let base = fs::canonicalize(td.path()).unwrap();
    let cfg = base.join("config.yaml");
    write_cfg(&cfg, &base.join("store"));

    let out = linkstash(&cfg).arg("install").output().expect("spawn install");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("--all"), "{stderr}");
}
