//! Conflict classification and resolution planning.

use chrono::Local;

use crate::link_ops::types::{ConflictCase, ConflictChoice, PathState};

/// Classify a probed (source, backup) pair.
///
/// Pure and total over every state combination. Symlink-ness of the source
/// always wins: a link is recreated, never treated as content. A real
/// source facing a backup slot that itself holds a symlink relocates
/// directly; the stale slot entry is cleared first by the install step.
pub fn classify(from: PathState, to: PathState) -> ConflictCase {
    match (from.exists, from.is_symlink, to.exists) {
        (false, _, false) => ConflictCase::SourceAndBackupMissing,
        (false, _, true) => ConflictCase::CreateLinkOnly,
        (true, true, _) => ConflictCase::CreateLinkOnly,
        (true, false, false) => ConflictCase::DirectRelocate,
        (true, false, true) => {
            if to.is_symlink {
                ConflictCase::DirectRelocate
            } else {
                ConflictCase::UserConflict
            }
        }
    }
}

/// Relocation work left once `choice` is applied. The losing side is
/// archived first in either case; keeping the source still means relocating
/// it into the freed slot, while keeping the backup leaves nothing to move.
pub fn resolution_case(choice: ConflictChoice) -> ConflictCase {
    match choice {
        ConflictChoice::KeepSource => ConflictCase::DirectRelocate,
        ConflictChoice::KeepBackup => ConflictCase::NoAction,
    }
}

/// Slot-relative archival name for the losing side of a conflict:
/// `<slot>-backup-<YYYY-MM-DD-HHMMSS>`, local time.
pub fn archival_name(slot: &str) -> String {
    archival_name_at(slot, Local::now())
}

fn archival_name_at(slot: &str, at: chrono::DateTime<Local>) -> String {
    format!("{}-backup-{}", slot, at.format("%Y-%m-%d-%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn state(exists: bool, is_symlink: bool) -> PathState {
        PathState {
            exists,
            is_symlink,
            is_dir: false,
        }
    }

    #[test]
    fn both_missing() {
        assert_eq!(
            classify(state(false, false), state(false, false)),
            ConflictCase::SourceAndBackupMissing
        );
    }

    #[test]
    fn backup_only_recreates_the_link() {
        assert_eq!(
            classify(state(false, false), state(true, false)),
            ConflictCase::CreateLinkOnly
        );
    }

    #[test]
    fn real_source_with_free_slot_relocates() {
        assert_eq!(
            classify(state(true, false), state(false, false)),
            ConflictCase::DirectRelocate
        );
    }

    #[test]
    fn source_symlink_always_recreates() {
        for to in [state(false, false), state(true, false), state(true, true)] {
            assert_eq!(
                classify(state(true, true), to),
                ConflictCase::CreateLinkOnly
            );
        }
        // Dangling source link: slot decides between recreate and
        // attempt-anyway.
        assert_eq!(
            classify(state(false, true), state(true, false)),
            ConflictCase::CreateLinkOnly
        );
        assert_eq!(
            classify(state(false, true), state(false, false)),
            ConflictCase::SourceAndBackupMissing
        );
    }

    #[test]
    fn real_content_on_both_sides_is_a_conflict() {
        assert_eq!(
            classify(state(true, false), state(true, false)),
            ConflictCase::UserConflict
        );
    }

    #[test]
    fn stale_slot_symlink_relocates_directly() {
        assert_eq!(
            classify(state(true, false), state(true, true)),
            ConflictCase::DirectRelocate
        );
    }

    #[test]
    fn classification_is_total() {
        // Every combination of the two probed flags on both sides answers
        // without panicking, and never with NoAction, which only resolution
        // planning produces.
        for fe in [false, true] {
            for fl in [false, true] {
                for te in [false, true] {
                    for tl in [false, true] {
                        let case = classify(state(fe, fl), state(te, tl));
                        assert_ne!(case, ConflictCase::NoAction);
                    }
                }
            }
        }
    }

    #[test]
    fn keep_source_still_relocates() {
        assert_eq!(
            resolution_case(ConflictChoice::KeepSource),
            ConflictCase::DirectRelocate
        );
        assert_eq!(
            resolution_case(ConflictChoice::KeepBackup),
            ConflictCase::NoAction
        );
    }

    #[test]
    fn archival_name_carries_slot_and_timestamp() {
        let at = Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            archival_name_at("Fonts", at),
            "Fonts-backup-2025-03-09-140507"
        );
        assert_eq!(
            archival_name_at("Apps/Code", at),
            "Apps/Code-backup-2025-03-09-140507"
        );
    }
}
