use assert_cmd::cargo;
use std::process::Command;

#[test]
fn version_runs() {
    let out = Command::new(cargo::cargo_bin!("linkstash"))
        .arg("--version")
        .output()
        .expect("spawn binary");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("linkstash"), "{stdout}");
}

#[test]
fn help_names_the_subcommands() {
    let out = Command::new(cargo::cargo_bin!("linkstash"))
        .arg("--help")
        .output()
        .expect("spawn binary");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    for sub in ["install", "uninstall", "status", "add", "remove", "recipes", "init"] {
        assert!(stdout.contains(sub), "help should mention '{sub}': {stdout}");
    }
}

/// No arguments prints help and exits nonzero rather than doing anything.
#[test]
fn bare_invocation_shows_usage() {
    let out = Command::new(cargo::cargo_bin!("linkstash"))
        .output()
        .expect("spawn binary");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Usage"), "{stderr}");
}
