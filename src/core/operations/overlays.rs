//! Delete overlay images left beside the media they decorate.

use super::{OperationKind, OperationPlan, PlannedAction};
use crate::core::config::TidyConfig;
use crate::core::mover::PendingChanges;
use crate::core::scanner::{FileScanner, ScanConfig, WalkDirScanner};
use crate::error::TidyError;
use crate::events::EventSender;
use regex::Regex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// `*-overlay.{png,webp}`, `*overlay~*.{png,webp}` and `*_extracted_2.png`
static OVERLAY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:.*-overlay\.(?:png|webp)|.*overlay~.*\.(?:png|webp)|.*_extracted_2\.png)$")
        .expect("valid regex")
});

/// Whether a file name marks an overlay image
pub fn is_overlay(name: &str) -> bool {
    OVERLAY_NAME.is_match(name)
}

/// Plan deleting every overlay under the root and the extra overlay
/// directories. A file reachable from two roots is deleted once.
pub fn plan_delete_overlays(
    config: &TidyConfig,
    events: &EventSender,
) -> Result<OperationPlan, TidyError> {
    plan_delete_overlays_pending(config, &PendingChanges::new(), events)
}

pub(super) fn plan_delete_overlays_pending(
    config: &TidyConfig,
    pending: &PendingChanges,
    events: &EventSender,
) -> Result<OperationPlan, TidyError> {
    let scanner = WalkDirScanner::new(
        ScanConfig::recursive()
            .with_hidden(config.include_hidden)
            .with_symlinks(config.follow_symlinks),
    );

    let mut plan = OperationPlan::new(OperationKind::DeleteOverlays);
    let mut seen: HashSet<PathBuf> = HashSet::new();

    let scanned = scanner.scan_with_events(&config.root, events)?;
    let mut files = pending.overlay(scanned.files, |p| p.starts_with(&config.root));
    plan.errors
        .extend(scanned.errors.iter().map(ToString::to_string));

    for dir in &config.extra_overlay_dirs {
        match scanner.scan_with_events(dir, events) {
            Ok(extra) => {
                files.extend(extra.files);
                plan.errors
                    .extend(extra.errors.iter().map(ToString::to_string));
            }
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "skipping overlay directory");
                plan.errors.push(e.to_string());
            }
        }
    }

    for file in files {
        let matches = file
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_overlay);
        if matches && !pending.has_departed(&file) && seen.insert(file.clone()) {
            debug!(path = %file.display(), "overlay");
            plan.actions.push(PlannedAction::Delete(file));
        }
    }

    Ok(plan)
}
