use std::fs;

use linkstash::testkit::Scratch;

/// Install then uninstall: the link disappears, the backup stays exactly
/// where install put it. Restoring content is deliberately not uninstall's
/// job.
#[test]
fn uninstall_removes_link_and_keeps_backup() {
    let rig = Scratch::new();
    let spec = rig.spec("Fonts", "Library/Fonts", "Fonts");
    rig.seed_file("Library/Fonts/a.ttf", "glyphs");
    let paths = rig.resolver().resolve(&spec);

    rig.installer().install(&spec).expect("install");
    let outcome = rig.uninstaller().uninstall(&spec).expect("uninstall");

    assert!(outcome.success, "{}", outcome.message);
    assert!(
        fs::symlink_metadata(&paths.source).is_err(),
        "source path should be gone entirely"
    );
    assert_eq!(
        fs::read_to_string(paths.backup.join("a.ttf")).unwrap(),
        "glyphs",
        "the backup must survive an uninstall"
    );
    assert!(
        outcome.message.contains(&paths.backup.display().to_string()),
        "message should say where the backup remains: {}",
        outcome.message
    );
}

/// Uninstall with nothing at the source is a clean no-op success.
#[test]
fn uninstall_twice_is_a_noop() {
    let rig = Scratch::new();
    let spec = rig.spec("Zshrc", ".zshrc", "Zsh/.zshrc");
    rig.seed_file(".zshrc", "x");

    rig.installer().install(&spec).expect("install");
    rig.uninstaller().uninstall(&spec).expect("first uninstall");
    let again = rig.uninstaller().uninstall(&spec).expect("second uninstall");
    assert!(again.success);
    assert!(again.message.contains("already uninstalled"), "{}", again.message);
}

/// Uninstall removes whatever occupies the source, symlink or not. Real
/// content at the source is removed the same way; the engine does not
/// second-guess the caller here.
#[test]
fn uninstall_clears_real_content_too() {
    let rig = Scratch::new();
    let spec = rig.spec("Fonts", "Library/Fonts", "Fonts");
    rig.seed_file("Library/Fonts/a.ttf", "not a link");
    let paths = rig.resolver().resolve(&spec);

    let outcome = rig.uninstaller().uninstall(&spec).expect("uninstall");
    assert!(outcome.success);
    assert!(fs::symlink_metadata(&paths.source).is_err());
}

#[test]
fn dry_run_uninstall_touches_nothing() {
    let rig = Scratch::new();
    let spec = rig.spec("Zshrc", ".zshrc", "Zsh/.zshrc");
    rig.seed_file(".zshrc", "keep me");
    let paths = rig.resolver().resolve(&spec);

    rig.installer().install(&spec).expect("install");
    let outcome = rig
        .uninstaller()
        .dry_run(true)
        .uninstall(&spec)
        .expect("dry uninstall");
    assert!(outcome.success);
    assert!(outcome.message.starts_with("dry run:"), "{}", outcome.message);
    assert!(
        fs::symlink_metadata(&paths.source).unwrap().file_type().is_symlink(),
        "dry run must leave the link in place"
    );
}
