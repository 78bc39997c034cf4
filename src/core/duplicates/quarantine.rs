//! Quarantine planning for detected duplicates.

use super::DuplicateScan;
use crate::core::mover::{plan_move, DestinationLedger, RenamePlan, SuffixStyle};
use std::path::Path;

/// One move per duplicate into `quarantine_dir`, named after the file with
/// `_N` suffixes on collision.
///
/// The ledger sees the quarantine directory's current contents, so files
/// left there by an earlier run are never overwritten.
pub fn plan_quarantine(scan: &DuplicateScan, quarantine_dir: &Path) -> Vec<RenamePlan> {
    plan_quarantine_with(scan, quarantine_dir, &mut DestinationLedger::new())
}

/// [`plan_quarantine`] against a caller's ledger
pub fn plan_quarantine_with(
    scan: &DuplicateScan,
    quarantine_dir: &Path,
    ledger: &mut DestinationLedger,
) -> Vec<RenamePlan> {
    scan.duplicates()
        .into_iter()
        .filter_map(|duplicate| {
            let name = duplicate.file_name()?;
            Some(plan_move(
                ledger,
                duplicate,
                quarantine_dir,
                name,
                SuffixStyle::Numbered,
            ))
        })
        .collect()
}
