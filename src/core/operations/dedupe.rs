//! Quarantine byte-identical copies.

use super::{OperationKind, OperationPlan, PlannedAction};
use crate::core::config::TidyConfig;
use crate::core::duplicates::{plan_quarantine_with, DuplicateDetector, DuplicateScan};
use crate::core::mover::PendingChanges;
use crate::error::TidyError;
use crate::events::EventSender;

/// Detect duplicates under the root and plan moving each into the
/// quarantine directory. The scan is returned alongside for reporting.
pub fn plan_find_duplicates(
    config: &TidyConfig,
    events: &EventSender,
) -> Result<(OperationPlan, DuplicateScan), TidyError> {
    plan_find_duplicates_pending(config, &PendingChanges::new(), events)
}

pub(super) fn plan_find_duplicates_pending(
    config: &TidyConfig,
    pending: &PendingChanges,
    events: &EventSender,
) -> Result<(OperationPlan, DuplicateScan), TidyError> {
    let scan = DuplicateDetector::new(config).find_duplicates_pending(&config.root, pending, events)?;

    let mut plan = OperationPlan::new(OperationKind::FindDuplicates);
    if scan.cancelled {
        plan.errors.push("duplicate detection was cancelled".to_string());
    }
    let mut ledger = pending.ledger();
    plan.actions = plan_quarantine_with(&scan, &config.quarantine_dir(), &mut ledger)
        .into_iter()
        .map(PlannedAction::Move)
        .collect();

    Ok((plan, scan))
}
