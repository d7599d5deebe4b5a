use std::fs;

use linkstash::testkit::Scratch;

/// Happy path: real content at the source, empty slot. The content moves
/// into the store and a symlink takes its place.
#[test]
fn file_install_relocates_and_links() {
    let rig = Scratch::new();
    let spec = rig.spec("Zshrc", ".zshrc", "Zsh/.zshrc");
    rig.seed_file(".zshrc", "export EDITOR=vim\n");
    let paths = rig.resolver().resolve(&spec);

    let outcome = rig.installer().install(&spec).expect("install should succeed");

    assert!(outcome.success, "outcome: {}", outcome.message);
    assert!(outcome.verified, "final link should verify");
    assert!(outcome.archived.is_none(), "nothing to archive on a clean install");

    let meta = fs::symlink_metadata(&paths.source).expect("source entry");
    assert!(meta.file_type().is_symlink(), "source should be a symlink");
    assert_eq!(
        fs::read_link(&paths.source).expect("read link"),
        paths.backup,
        "link should point at the backup slot"
    );
    assert_eq!(
        fs::read_to_string(&paths.backup).expect("backup content"),
        "export EDITOR=vim\n",
        "content should live in the store now"
    );
    // Reading through the link still works.
    assert_eq!(fs::read_to_string(&paths.source).unwrap(), "export EDITOR=vim\n");
}

#[test]
fn reinstall_is_idempotent() {
    let rig = Scratch::new();
    let spec = rig.spec("Zshrc", ".zshrc", "Zsh/.zshrc");
    rig.seed_file(".zshrc", "alias ll='ls -l'\n");
    let paths = rig.resolver().resolve(&spec);

    rig.installer().install(&spec).expect("first install");
    let second = rig.installer().install(&spec).expect("second install");

    assert!(second.success && second.verified);
    assert_eq!(
        fs::read_to_string(&paths.backup).unwrap(),
        "alias ll='ls -l'\n",
        "reinstall must not disturb the backup"
    );
    assert!(fs::symlink_metadata(&paths.source).unwrap().file_type().is_symlink());
}

/// Directory sources move with their nested content intact.
#[test]
fn directory_install_keeps_nested_content() {
    let rig = Scratch::new();
    let spec = rig.spec("Fonts", "Library/Fonts", "Fonts");
    rig.seed_dir("Library/Fonts/Nested");
    rig.seed_file("Library/Fonts/InterVariable.ttf", "glyphs");
    rig.seed_file("Library/Fonts/Nested/Mono.ttf", "mono glyphs");
    let paths = rig.resolver().resolve(&spec);

    let outcome = rig.installer().install(&spec).expect("install");
    assert!(outcome.success, "{}", outcome.message);

    assert!(paths.backup.is_dir(), "slot should be a directory");
    assert_eq!(
        fs::read_to_string(paths.backup.join("InterVariable.ttf")).unwrap(),
        "glyphs"
    );
    assert_eq!(
        fs::read_to_string(paths.backup.join("Nested/Mono.ttf")).unwrap(),
        "mono glyphs"
    );
    assert!(fs::symlink_metadata(&paths.source).unwrap().file_type().is_symlink());
    // The directory is reachable through the link.
    assert!(paths.source.join("Nested/Mono.ttf").exists());
}

/// An existing backup with nothing at the source only needs the link.
#[test]
fn backup_only_just_links() {
    let rig = Scratch::new();
    let spec = rig.spec("SSH", ".ssh", "SSH");
    rig.seed_slot("SSH/config", "Host example\n");
    let paths = rig.resolver().resolve(&spec);

    let outcome = rig.installer().install(&spec).expect("install");
    assert!(outcome.success && outcome.verified, "{}", outcome.message);
    assert_eq!(fs::read_link(&paths.source).unwrap(), paths.backup);
    assert_eq!(
        fs::read_to_string(paths.source.join("config")).unwrap(),
        "Host example\n"
    );
}
