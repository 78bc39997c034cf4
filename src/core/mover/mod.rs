//! # Mover Module
//!
//! The collision-safe rename/move primitive shared by every mutating
//! operation.
//!
//! ## Collision policy
//! If `dir/name` is free it is used as-is. Otherwise the name is split into
//! stem and extension and a suffix is appended to the stem, counting up from
//! 1 until a free name turns up:
//!
//! | Style      | `photo.jpg` collides to        | Used by               |
//! |------------|--------------------------------|-----------------------|
//! | `Copy`     | `photo_copy1.jpg`, `_copy2`... | flatten, date-rename  |
//! | `Numbered` | `photo_1.jpg`, `photo_2.jpg`...| duplicate quarantine  |
//!
//! "Free" is answered by a [`DestinationLedger`], so the same existing-file
//! set always yields the same names, dry-run or not.

mod ledger;
mod pending;
mod transfer;

pub use ledger::DestinationLedger;
pub use pending::PendingChanges;

use crate::error::MoveError;
use ledger::exists_on_disk;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Suffix token appended to the stem on collision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixStyle {
    /// `_copyN`
    Copy,
    /// `_N`
    Numbered,
}

impl SuffixStyle {
    fn token(self, n: usize) -> String {
        match self {
            SuffixStyle::Copy => format!("_copy{n}"),
            SuffixStyle::Numbered => format!("_{n}"),
        }
    }
}

/// A decided move: where a file goes and under which name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub original_path: PathBuf,
    pub destination_dir: PathBuf,
    /// Name asked for
    pub proposed_name: OsString,
    /// Name that will be used; differs from `proposed_name` only on collision
    pub final_name: OsString,
}

impl RenamePlan {
    /// Full destination path
    pub fn destination(&self) -> PathBuf {
        self.destination_dir.join(&self.final_name)
    }

    pub fn had_collision(&self) -> bool {
        self.proposed_name != self.final_name
    }
}

/// How a single action ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The filesystem was changed
    Performed,
    /// Dry-run: nothing was touched
    Simulated,
}

/// Decide the final destination for moving `original` to `destination_dir/desired_name`.
///
/// The chosen destination is claimed in `ledger` and `original` is marked
/// vacated, so later plans in the same batch see this one's effect.
pub fn plan_move(
    ledger: &mut DestinationLedger,
    original: &Path,
    destination_dir: &Path,
    desired_name: &OsStr,
    style: SuffixStyle,
) -> RenamePlan {
    let final_name = free_name(ledger, destination_dir, desired_name, style);

    ledger.claim(destination_dir.join(&final_name));
    ledger.vacate(original.to_path_buf());

    RenamePlan {
        original_path: original.to_path_buf(),
        destination_dir: destination_dir.to_path_buf(),
        proposed_name: desired_name.to_os_string(),
        final_name,
    }
}

/// First name in `desired, desired+suffix(1), desired+suffix(2), ...` that is free
pub fn free_name(
    ledger: &DestinationLedger,
    dir: &Path,
    desired: &OsStr,
    style: SuffixStyle,
) -> OsString {
    if !ledger.is_occupied(&dir.join(desired)) {
        return desired.to_os_string();
    }

    let (stem, ext) = split_name(desired);
    let mut n = 1;
    loop {
        let candidate = with_suffix(&stem, ext.as_deref(), &style.token(n));
        if !ledger.is_occupied(&dir.join(&candidate)) {
            return candidate;
        }
        n += 1;
    }
}

/// `archive.tar.gz` -> (`archive.tar`, `gz`); `.env` -> (`.env`, none)
fn split_name(name: &OsStr) -> (OsString, Option<OsString>) {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(OsStr::to_os_string)
        .unwrap_or_else(|| name.to_os_string());
    let ext = path.extension().map(OsStr::to_os_string);
    (stem, ext)
}

fn with_suffix(stem: &OsStr, ext: Option<&OsStr>, suffix: &str) -> OsString {
    let mut name = stem.to_os_string();
    name.push(suffix);
    if let Some(ext) = ext {
        name.push(".");
        name.push(ext);
    }
    name
}

/// Carry out `plan`, or only report it under dry-run.
///
/// A destination that appeared since planning is never overwritten; the
/// move fails with [`MoveError::DestinationExists`] instead.
pub fn apply_move(plan: &RenamePlan, dry_run: bool) -> Result<Applied, MoveError> {
    let destination = plan.destination();

    if dry_run {
        info!(
            from = %plan.original_path.display(),
            to = %destination.display(),
            "dry-run: would move"
        );
        return Ok(Applied::Simulated);
    }

    if !exists_on_disk(&plan.original_path) {
        return Err(MoveError::SourceMissing {
            path: plan.original_path.clone(),
        });
    }
    if !plan.destination_dir.is_dir() {
        fs::create_dir_all(&plan.destination_dir).map_err(|source| MoveError::CreateDir {
            path: plan.destination_dir.clone(),
            source,
        })?;
    }

    transfer::move_no_clobber(&plan.original_path, &destination)?;
    info!(
        from = %plan.original_path.display(),
        to = %destination.display(),
        "moved"
    );
    Ok(Applied::Performed)
}

/// Delete `path`, or only report it under dry-run.
pub fn apply_delete(path: &Path, dry_run: bool) -> Result<Applied, MoveError> {
    if dry_run {
        info!(path = %path.display(), "dry-run: would delete");
        return Ok(Applied::Simulated);
    }

    match fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "deleted");
            Ok(Applied::Performed)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(MoveError::SourceMissing {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(MoveError::Delete {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn free_name_is_used_unchanged() {
        let temp = TempDir::new().unwrap();
        let ledger = DestinationLedger::new();

        let name = free_name(&ledger, temp.path(), OsStr::new("photo.jpg"), SuffixStyle::Copy);
        assert_eq!(name, "photo.jpg");
    }

    #[test]
    fn copy_suffix_counts_up_deterministically() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("photo.jpg"));
        let ledger = DestinationLedger::new();

        let first = free_name(&ledger, temp.path(), OsStr::new("photo.jpg"), SuffixStyle::Copy);
        assert_eq!(first, "photo_copy1.jpg");

        touch(&temp.path().join("photo_copy1.jpg"));
        let second = free_name(&ledger, temp.path(), OsStr::new("photo.jpg"), SuffixStyle::Copy);
        assert_eq!(second, "photo_copy2.jpg");

        let again = free_name(&ledger, temp.path(), OsStr::new("photo.jpg"), SuffixStyle::Copy);
        assert_eq!(again, second);
    }

    #[test]
    fn numbered_suffix_for_quarantine() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("clip.mp4"));
        touch(&temp.path().join("clip_1.mp4"));
        let ledger = DestinationLedger::new();

        let name = free_name(&ledger, temp.path(), OsStr::new("clip.mp4"), SuffixStyle::Numbered);
        assert_eq!(name, "clip_2.mp4");
    }

    #[test]
    fn suffix_goes_after_date_prefix_and_stem() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("2020-01-01_photo.jpg"));
        let ledger = DestinationLedger::new();

        let name = free_name(
            &ledger,
            temp.path(),
            OsStr::new("2020-01-01_photo.jpg"),
            SuffixStyle::Copy,
        );
        assert_eq!(name, "2020-01-01_photo_copy1.jpg");
    }

    #[test]
    fn names_without_extension_and_dotfiles() {
        assert_eq!(
            with_suffix(OsStr::new("README"), None, "_copy1"),
            OsString::from("README_copy1")
        );
        let (stem, ext) = split_name(OsStr::new(".env"));
        assert_eq!(stem, ".env");
        assert!(ext.is_none());
        let (stem, ext) = split_name(OsStr::new("archive.tar.gz"));
        assert_eq!(stem, "archive.tar");
        assert_eq!(ext.as_deref(), Some(OsStr::new("gz")));
    }

    #[test]
    fn consecutive_plans_never_share_a_name() {
        let temp = TempDir::new().unwrap();
        let sub_a = temp.path().join("a");
        let sub_b = temp.path().join("b");
        fs::create_dir_all(&sub_a).unwrap();
        fs::create_dir_all(&sub_b).unwrap();
        touch(&sub_a.join("snap.jpg"));
        touch(&sub_b.join("snap.jpg"));
        touch(&temp.path().join("snap.jpg"));

        let mut ledger = DestinationLedger::new();
        let first = plan_move(
            &mut ledger,
            &sub_a.join("snap.jpg"),
            temp.path(),
            OsStr::new("snap.jpg"),
            SuffixStyle::Copy,
        );
        let second = plan_move(
            &mut ledger,
            &sub_b.join("snap.jpg"),
            temp.path(),
            OsStr::new("snap.jpg"),
            SuffixStyle::Copy,
        );

        assert_eq!(first.final_name, "snap_copy1.jpg");
        assert_eq!(second.final_name, "snap_copy2.jpg");
        assert!(first.had_collision());
    }

    #[test]
    fn dry_run_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.jpg");
        touch(&source);
        let mut ledger = DestinationLedger::new();
        let plan = plan_move(
            &mut ledger,
            &source,
            temp.path(),
            OsStr::new("b.jpg"),
            SuffixStyle::Copy,
        );

        assert_eq!(apply_move(&plan, true).unwrap(), Applied::Simulated);
        assert!(source.exists());
        assert!(!temp.path().join("b.jpg").exists());

        assert_eq!(apply_delete(&source, true).unwrap(), Applied::Simulated);
        assert!(source.exists());
    }

    #[test]
    fn live_move_creates_destination_directory() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.jpg");
        touch(&source);
        let quarantine = temp.path().join("duplicates");
        let mut ledger = DestinationLedger::new();
        let plan = plan_move(
            &mut ledger,
            &source,
            &quarantine,
            OsStr::new("a.jpg"),
            SuffixStyle::Numbered,
        );

        assert_eq!(apply_move(&plan, false).unwrap(), Applied::Performed);
        assert!(!source.exists());
        assert!(quarantine.join("a.jpg").exists());
    }

    #[test]
    fn destination_created_after_planning_is_not_clobbered() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.jpg");
        fs::write(&source, b"mine").unwrap();
        let mut ledger = DestinationLedger::new();
        let plan = plan_move(
            &mut ledger,
            &source,
            temp.path(),
            OsStr::new("b.jpg"),
            SuffixStyle::Copy,
        );

        // Someone else grabs the name between plan and apply
        fs::write(temp.path().join("b.jpg"), b"theirs").unwrap();

        let result = apply_move(&plan, false);
        assert!(matches!(result, Err(MoveError::DestinationExists { .. })));
        assert_eq!(fs::read(temp.path().join("b.jpg")).unwrap(), b"theirs");
        assert!(source.exists());
    }

    #[test]
    fn missing_source_is_reported() {
        let temp = TempDir::new().unwrap();
        let mut ledger = DestinationLedger::new();
        let plan = plan_move(
            &mut ledger,
            &temp.path().join("gone.jpg"),
            temp.path(),
            OsStr::new("b.jpg"),
            SuffixStyle::Copy,
        );

        assert!(matches!(
            apply_move(&plan, false),
            Err(MoveError::SourceMissing { .. })
        ));
        assert!(matches!(
            apply_delete(&temp.path().join("gone.jpg"), false),
            Err(MoveError::SourceMissing { .. })
        ));
    }
}
