//! Prefix root files with their resolved date.

use super::{OperationKind, OperationPlan, PlannedAction};
use crate::core::config::TidyConfig;
use crate::core::date::{has_date_prefix, DateResolver};
use crate::core::mover::{plan_move, PendingChanges, SuffixStyle};
use crate::core::scanner::{FileScanner, ScanConfig, WalkDirScanner};
use crate::error::TidyError;
use crate::events::EventSender;
use std::ffi::OsString;
use tracing::debug;

/// Plan `photo.jpg` -> `2020-01-01_photo.jpg` for every file directly in the
/// root. Files that already carry a date prefix are skipped.
pub fn plan_rename(config: &TidyConfig, events: &EventSender) -> Result<OperationPlan, TidyError> {
    plan_rename_pending(config, &PendingChanges::new(), events)
}

pub(super) fn plan_rename_pending(
    config: &TidyConfig,
    pending: &PendingChanges,
    events: &EventSender,
) -> Result<OperationPlan, TidyError> {
    let scanner = WalkDirScanner::new(
        ScanConfig::top_level()
            .with_hidden(config.include_hidden)
            .with_symlinks(config.follow_symlinks),
    );
    let scanned = scanner.scan_with_events(&config.root, events)?;
    let files = pending.overlay(scanned.files, |p| p.parent() == Some(config.root.as_path()));

    let mut plan = OperationPlan::new(OperationKind::Rename);
    plan.errors
        .extend(scanned.errors.iter().map(ToString::to_string));

    let resolver = DateResolver::new();
    let mut ledger = pending.ledger();

    for file in files {
        let Some(name) = file.file_name() else {
            continue;
        };
        if has_date_prefix(&name.to_string_lossy()) {
            debug!(path = %file.display(), "already dated");
            plan.skipped.push(file);
            continue;
        }

        let date = resolver.resolve_from(&file, pending.content_path(&file));
        let mut desired = OsString::from(date.prefix());
        desired.push(name);

        let rename = plan_move(&mut ledger, &file, &config.root, &desired, SuffixStyle::Copy);
        plan.actions.push(PlannedAction::Move(rename));
    }

    Ok(plan)
}
