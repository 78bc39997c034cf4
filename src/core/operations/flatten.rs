//! Move every file in a subdirectory up to the root.

use super::{OperationKind, OperationPlan, PlannedAction};
use crate::core::config::TidyConfig;
use crate::core::mover::{plan_move, PendingChanges, SuffixStyle};
use crate::core::scanner::{EntryFilter, FileScanner, ScanConfig, WalkDirScanner};
use crate::error::TidyError;
use crate::events::EventSender;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Plan moving every nested file to the root with `_copyN` collisions.
/// The quarantine directory is left alone.
pub fn plan_flatten(config: &TidyConfig, events: &EventSender) -> Result<OperationPlan, TidyError> {
    plan_flatten_pending(config, &PendingChanges::new(), events)
}

pub(super) fn plan_flatten_pending(
    config: &TidyConfig,
    pending: &PendingChanges,
    events: &EventSender,
) -> Result<OperationPlan, TidyError> {
    let quarantine = config.quarantine_dir();
    let scanner = WalkDirScanner::new(
        ScanConfig::recursive()
            .excluding(quarantine.clone())
            .with_hidden(config.include_hidden)
            .with_symlinks(config.follow_symlinks),
    );
    let scanned = scanner.scan_with_events(&config.root, events)?;
    let files = pending.overlay(scanned.files, |p| !p.starts_with(&quarantine));

    let mut plan = OperationPlan::new(OperationKind::Flatten);
    plan.errors
        .extend(scanned.errors.iter().map(ToString::to_string));

    let mut ledger = pending.ledger();
    for file in files {
        if file.parent() == Some(config.root.as_path()) {
            continue;
        }
        let Some(name) = file.file_name() else {
            continue;
        };
        let rename = plan_move(&mut ledger, &file, &config.root, name, SuffixStyle::Copy);
        debug!(
            from = %file.display(),
            to = %rename.destination().display(),
            "flatten"
        );
        plan.actions.push(PlannedAction::Move(rename));
    }

    Ok(plan)
}

/// Subdirectories of the root that pruning walks, deepest first.
/// The quarantine directory and skipped hidden directories are left out.
fn prunable_dirs(config: &TidyConfig) -> impl Iterator<Item = DirEntry> {
    let filter = EntryFilter::new()
        .with_hidden(config.include_hidden)
        .with_excluded(vec![config.quarantine_dir()]);

    WalkDir::new(&config.root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_entry(move |e| filter.keep(e))
        .flatten()
        .filter(|e| e.file_type().is_dir())
}

/// Remove empty subdirectories of the root, deepest first.
///
/// The root and the quarantine directory are kept, as are directories the
/// scan did not descend into (hidden ones, unless included). Returns the
/// number removed.
pub fn remove_empty_dirs(config: &TidyConfig) -> usize {
    let mut removed = 0;
    for entry in prunable_dirs(config) {
        match fs::remove_dir(entry.path()) {
            Ok(()) => {
                debug!(path = %entry.path().display(), "removed empty directory");
                removed += 1;
            }
            Err(e) => debug!(path = %entry.path().display(), error = %e, "directory kept"),
        }
    }
    removed
}

/// Directories [`remove_empty_dirs`] would remove once `pending` is applied
pub fn empty_dirs_after(config: &TidyConfig, pending: &PendingChanges) -> Vec<PathBuf> {
    let mut emptied: HashSet<PathBuf> = HashSet::new();
    let mut order = Vec::new();

    for entry in prunable_dirs(config) {
        let dir = entry.path();
        if pending.has_arrivals_under(dir) {
            continue;
        }
        let Ok(children) = fs::read_dir(dir) else {
            continue;
        };
        let empty = children.flatten().all(|child| {
            let path = child.path();
            emptied.contains(&path) || pending.has_departed(&path)
        });
        if empty {
            emptied.insert(dir.to_path_buf());
            order.push(dir.to_path_buf());
        }
    }
    order
}
