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

struct ConflictFixture {
    cfg: std::path::PathBuf,
    source: std::path::PathBuf,
    slot: std::path::PathBuf,
    _td: tempfile::TempDir,
}

/// A store and a link whose source and slot both hold real content.
fn conflicted() -> ConflictFixture {
    let td = tempdir().unwrap();
    let base = fs::canonicalize(td.path()).unwrap();
    let cfg = base.join("config.yaml");
    let store = base.join("store");
    write_cfg(&cfg, &store);

    let source = base.join("Fonts");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("local.ttf"), "local").unwrap();
    let slot = store.join("Fonts");
    fs::create_dir_all(&slot).unwrap();
    fs::write(slot.join("synced.ttf"), "synced").unwrap();

    let out = linkstash(&cfg)
        .args(["add", "Fonts", "--from"])
        .arg(&source)
        .output()
        .expect("spawn add");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    ConflictFixture {
        cfg,
        source,
        slot,
        _td: td,
    }
}

/// Without a decision the install stops with the dedicated exit code,
/// prints both sides and moves nothing.
#[test]
fn unresolved_conflict_exits_2_and_moves_nothing() {
    let fx = conflicted();

    let out = linkstash(&fx.cfg)
        .args(["install", "Fonts"])
        .output()
        .expect("spawn install");
    assert_eq!(out.status.code(), Some(2), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("--keep source") && stdout.contains("--keep backup"), "{stdout}");
    assert!(stdout.contains(&fx.source.display().to_string()), "{stdout}");

    assert!(fx.source.join("local.ttf").exists());
    assert!(fx.slot.join("synced.ttf").exists());
    assert!(!fs::symlink_metadata(&fx.source).unwrap().file_type().is_symlink());
}

/// `--keep source` resolves in one invocation: the slot content is archived
/// with the timestamped suffix and the source is relocated and linked.
#[test]
fn keep_source_resolves_and_archives() {
    let fx = conflicted();

    let out = linkstash(&fx.cfg)
        .args(["install", "Fonts", "--keep", "source"])
        .output()
        .expect("spawn install");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    assert_eq!(fs::read_to_string(fx.slot.join("local.ttf")).unwrap(), "local");
    assert!(!fx.slot.join("synced.ttf").exists());
    assert_eq!(fs::read_link(&fx.source).unwrap(), fx.slot);

    let archive = fs::read_dir(fx.slot.parent().unwrap())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .find(|n| n.starts_with("Fonts-backup-"))
        .expect("an archival sibling should exist");
    let archived = fx.slot.parent().unwrap().join(archive);
    assert_eq!(
        fs::read_to_string(archived.join("synced.ttf")).unwrap(),
        "synced",
        "the losing slot content must survive in the archive"
    );
}

/// The config file can carry a standing answer, so unattended runs never
/// stop on a conflict.
#[test]
fn on_conflict_policy_from_config_applies() {
    let fx = conflicted();
    let mut yaml = fs::read_to_string(&fx.cfg).unwrap();
    yaml.push_str("on_conflict: keep-backup\n");
    fs::write(&fx.cfg, yaml).unwrap();

    let out = linkstash(&fx.cfg)
        .args(["install", "Fonts"])
        .output()
        .expect("spawn install");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    assert_eq!(fs::read_to_string(fx.slot.join("synced.ttf")).unwrap(), "synced");
    assert_eq!(fs::read_link(&fx.source).unwrap(), fx.slot);
    let archived = fs::read_dir(fx.slot.parent().unwrap())
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| e.file_name().to_string_lossy().starts_with("Fonts-backup-"));
    assert!(archived, "the source content must be archived, not dropped");
}
