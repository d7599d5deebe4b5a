//! Consistent user-facing printing. Colors only when stdout is a TTY;
//! primary lines stay plain so scripts can parse them.

use owo_colors::OwoColorize;

use crate::link_ops::{InstallOutcome, LinkStatus, PendingConflict};

fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

pub fn print_info(msg: &str) {
    if is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {}", msg);
    }
}

pub fn print_warn(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {}", msg);
    }
}

pub fn print_error(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {}", msg);
    }
}

pub fn print_success(msg: &str) {
    if is_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {}", msg);
    }
}

/// Print a plain user-facing line (no prefix). Primary outputs such as
/// "Installed 'Fonts': ..." go through here.
pub fn print_user(msg: &str) {
    println!("{}", msg);
}

/// Render one install outcome at the right severity.
pub fn print_outcome(outcome: &InstallOutcome) {
    if outcome.needs_decision() {
        print_warn(&outcome.message);
    } else if outcome.success {
        print_success(&outcome.message);
    } else {
        print_error(&outcome.message);
    }
}

/// Show both sides of a pending conflict with the commands that resolve it.
pub fn print_pending(conflict: &PendingConflict) {
    print_warn(&format!(
        "'{}' has real content on both sides:",
        conflict.name
    ));
    let kind = |is_dir: bool| if is_dir { "directory" } else { "file" };
    print_user(&format!(
        "  source: {} ({})",
        conflict.source.display(),
        kind(conflict.source_is_dir)
    ));
    print_user(&format!(
        "  backup: {} ({})",
        conflict.backup.display(),
        kind(conflict.backup_is_dir)
    ));
    print_user(&format!(
        "Re-run with --keep source or --keep backup to resolve '{}'.",
        conflict.name
    ));
}

/// One aligned status line for listings.
pub fn print_status_line(name: &str, status: LinkStatus, width: usize) {
    let label = format!("[{status}]");
    if is_tty() {
        let colored = match status {
            LinkStatus::Installed => format!("{}", label.green()),
            LinkStatus::Conflict | LinkStatus::BrokenLink => format!("{}", label.red()),
            LinkStatus::ReadyToInstall | LinkStatus::BackupOnly => {
                format!("{}", label.yellow())
            }
            LinkStatus::Missing | LinkStatus::Unconfigured => {
                format!("{}", label.dimmed())
            }
        };
        println!("{name:<width$} {colored}");
    } else {
        println!("{name:<width$} {label}");
    }
}
