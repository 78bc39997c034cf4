//! # Operations Module
//!
//! The user-facing tidy operations, each split into a pure planning step and
//! one shared apply step.
//!
//! ## Operations
//! - `flatten` - Move every file in a subdirectory up to the root
//! - `rename` - Prefix root files with their `YYYY-MM-DD_` date
//! - `overlays` - Delete snapchat overlay images
//! - `dedupe` - Move byte-identical copies into the quarantine directory
//! - `shorten` - Rename dated files to `YYYY-MM-DD-NNN.ext`
//!
//! Planning never touches the filesystem, so the same plan is printed for a
//! dry-run and executed for a real run. [`apply_plan`] honours `dry_run` and
//! the cancellation token, and turns every per-file failure into an entry of
//! the [`OperationReport`] instead of aborting.
//!
//! A multi-step dry-run carries a [`PendingChanges`] from step to step, so
//! each step is planned against the tree the previous ones would leave.

mod dedupe;
mod flatten;
mod overlays;
mod rename;
mod shorten;

pub use dedupe::plan_find_duplicates;
pub use flatten::{empty_dirs_after, plan_flatten, remove_empty_dirs};
pub use overlays::{is_overlay, plan_delete_overlays};
pub use rename::plan_rename;
pub use shorten::{plan_shorten, shortened_name, SequenceCounters};

use crate::core::config::TidyConfig;
use crate::core::mover::{apply_delete, apply_move, PendingChanges, RenamePlan};
use crate::error::TidyError;
use crate::events::{ApplyEvent, ApplyProgress, Event, EventSender};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Which operation produced a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Flatten,
    Rename,
    DeleteOverlays,
    FindDuplicates,
    Shorten,
}

impl OperationKind {
    /// Steps of a full tidy run, in order
    pub const ALL_STEPS: [OperationKind; 4] = [
        OperationKind::Flatten,
        OperationKind::Rename,
        OperationKind::DeleteOverlays,
        OperationKind::FindDuplicates,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::Flatten => "flatten",
            OperationKind::Rename => "rename",
            OperationKind::DeleteOverlays => "delete-overlays",
            OperationKind::FindDuplicates => "find-duplicates",
            OperationKind::Shorten => "shorten",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single filesystem change an operation intends to make
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    Move(RenamePlan),
    Delete(PathBuf),
}

impl PlannedAction {
    /// File the action works on
    pub fn source(&self) -> &Path {
        match self {
            PlannedAction::Move(plan) => &plan.original_path,
            PlannedAction::Delete(path) => path,
        }
    }
}

/// Proposed actions for one operation, in the order they will be applied
#[derive(Debug, Clone)]
pub struct OperationPlan {
    pub operation: OperationKind,
    pub actions: Vec<PlannedAction>,
    /// Files looked at and deliberately left alone
    pub skipped: Vec<PathBuf>,
    /// Non-fatal problems met while planning
    pub errors: Vec<String>,
}

impl OperationPlan {
    pub fn new(operation: OperationKind) -> Self {
        Self {
            operation,
            actions: Vec::new(),
            skipped: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// What happened when a plan was applied
#[derive(Debug, Clone, Serialize)]
pub struct OperationReport {
    pub operation: OperationKind,
    pub dry_run: bool,
    /// Actions tried; less than the plan's length only when cancelled
    pub attempted: usize,
    /// Actions performed, or that would have been under dry-run
    pub succeeded: usize,
    pub failures: Vec<(PathBuf, String)>,
    pub cancelled: bool,
    pub duration_ms: u64,
}

/// Plan `kind` against the current state of `config.root`
pub fn plan(
    kind: OperationKind,
    config: &TidyConfig,
    events: &EventSender,
) -> Result<OperationPlan, TidyError> {
    plan_pending(kind, config, &PendingChanges::new(), events)
}

/// Plan `kind` as if `pending` had already been applied
pub fn plan_pending(
    kind: OperationKind,
    config: &TidyConfig,
    pending: &PendingChanges,
    events: &EventSender,
) -> Result<OperationPlan, TidyError> {
    match kind {
        OperationKind::Flatten => flatten::plan_flatten_pending(config, pending, events),
        OperationKind::Rename => rename::plan_rename_pending(config, pending, events),
        OperationKind::DeleteOverlays => {
            overlays::plan_delete_overlays_pending(config, pending, events)
        }
        OperationKind::FindDuplicates => {
            dedupe::plan_find_duplicates_pending(config, pending, events).map(|(p, _)| p)
        }
        OperationKind::Shorten => {
            shorten::plan_shorten_pending(config, pending, events).map(|(p, _)| p)
        }
    }
}

/// Record in `pending` what `plan` would have done, given its dry-run `report`.
/// Failed actions are left out. A flatten that moved something also prunes
/// the directories it would empty.
pub fn stage(
    pending: &mut PendingChanges,
    plan: &OperationPlan,
    report: &OperationReport,
    config: &TidyConfig,
) {
    let failed: HashSet<&Path> = report.failures.iter().map(|(p, _)| p.as_path()).collect();
    for action in plan.actions.iter().take(report.attempted) {
        if failed.contains(action.source()) {
            continue;
        }
        match action {
            PlannedAction::Move(rename) => pending.record_move(rename),
            PlannedAction::Delete(path) => pending.record_removal(path),
        }
    }

    if plan.operation == OperationKind::Flatten && report.succeeded > 0 {
        for dir in empty_dirs_after(config, pending) {
            pending.record_removal(&dir);
        }
    }
}

/// Execute `plan` under `config.dry_run`.
///
/// Stops issuing new actions once the cancellation token is set; the report
/// is then marked `cancelled`.
pub fn apply_plan(
    plan: &OperationPlan,
    config: &TidyConfig,
    events: &EventSender,
) -> OperationReport {
    let start = Instant::now();
    let total = plan.actions.len();
    let dry_run = config.dry_run;

    events.send(Event::Apply(ApplyEvent::Started {
        operation: plan.operation,
        total,
        dry_run,
    }));

    let mut report = OperationReport {
        operation: plan.operation,
        dry_run,
        attempted: 0,
        succeeded: 0,
        failures: Vec::new(),
        cancelled: false,
        duration_ms: 0,
    };

    if plan.operation == OperationKind::FindDuplicates && !dry_run && total > 0 {
        let quarantine = config.quarantine_dir();
        if let Err(e) = fs::create_dir_all(&quarantine) {
            warn!(path = %quarantine.display(), error = %e, "cannot create quarantine directory");
        }
    }

    for (i, action) in plan.actions.iter().enumerate() {
        if config.cancel.is_cancelled() {
            warn!(
                operation = %plan.operation,
                remaining = total - i,
                "cancelled, remaining actions not applied"
            );
            report.cancelled = true;
            break;
        }

        report.attempted += 1;
        let result = match action {
            PlannedAction::Move(rename) => apply_move(rename, dry_run),
            PlannedAction::Delete(path) => apply_delete(path, dry_run),
        };

        match result {
            Ok(_) => report.succeeded += 1,
            Err(e) => {
                let path = e.path().clone();
                warn!(path = %path.display(), error = %e, "action failed");
                events.send(Event::Apply(ApplyEvent::Failed {
                    path: path.clone(),
                    message: e.to_string(),
                }));
                report.failures.push((path, e.to_string()));
            }
        }

        events.send(Event::Apply(ApplyEvent::Progress(ApplyProgress {
            completed: i + 1,
            total,
            current_path: action.source().to_path_buf(),
        })));
    }

    if plan.operation == OperationKind::Flatten
        && !dry_run
        && !report.cancelled
        && report.succeeded > 0
    {
        let removed = remove_empty_dirs(config);
        info!(removed, "removed empty subdirectories");
    }

    report.duration_ms = start.elapsed().as_millis() as u64;
    events.send(Event::Apply(ApplyEvent::Completed {
        operation: plan.operation,
        succeeded: report.succeeded,
        attempted: report.attempted,
    }));
    report
}

/// Flatten, rename, delete overlays, then quarantine duplicates.
pub fn run_all(config: &TidyConfig, events: &EventSender) -> Result<Vec<OperationReport>, TidyError> {
    run_all_gated(config, events, |_| true)
}

/// [`run_all`], asking `gate` with each step's plan before applying it.
///
/// Each step is planned after the previous one was applied; under dry-run,
/// against the tree the previous steps would have left. A declined step is
/// not applied and gets no report; later steps still run.
pub fn run_all_gated(
    config: &TidyConfig,
    events: &EventSender,
    mut gate: impl FnMut(&OperationPlan) -> bool,
) -> Result<Vec<OperationReport>, TidyError> {
    let mut reports = Vec::with_capacity(OperationKind::ALL_STEPS.len());
    let mut pending = PendingChanges::new();

    for kind in OperationKind::ALL_STEPS {
        if config.cancel.is_cancelled() {
            break;
        }
        let step = plan_pending(kind, config, &pending, events)?;
        for error in &step.errors {
            warn!(operation = %kind, "{error}");
        }
        if !gate(&step) {
            info!(operation = %kind, "step declined");
            continue;
        }

        let report = apply_plan(&step, config, events);
        if report.dry_run {
            stage(&mut pending, &step, &report, config);
        }
        reports.push(report);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cancel::CancellationToken;
    use crate::core::mover::{plan_move, DestinationLedger, SuffixStyle};
    use crate::events::{null_sender, EventChannel};
    use std::ffi::OsStr;
    use tempfile::TempDir;

    fn move_plan(root: &Path, from: &str, to: &str) -> PlannedAction {
        let mut ledger = DestinationLedger::new();
        PlannedAction::Move(plan_move(
            &mut ledger,
            &root.join(from),
            root,
            OsStr::new(to),
            SuffixStyle::Copy,
        ))
    }

    #[test]
    fn dry_run_counts_match_live_counts() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.jpg"), b"a").unwrap();
        fs::write(temp.path().join("b.jpg"), b"b").unwrap();
        let mut plan = OperationPlan::new(OperationKind::Rename);
        plan.actions.push(move_plan(temp.path(), "a.jpg", "x.jpg"));
        plan.actions.push(move_plan(temp.path(), "b.jpg", "y.jpg"));

        let dry = TidyConfig::builder(temp.path()).build().unwrap();
        let dry_report = apply_plan(&plan, &dry, &null_sender());
        assert!(temp.path().join("a.jpg").exists());
        assert!(!temp.path().join("x.jpg").exists());

        let live = TidyConfig::builder(temp.path()).dry_run(false).build().unwrap();
        let live_report = apply_plan(&plan, &live, &null_sender());

        assert_eq!(dry_report.succeeded, 2);
        assert_eq!(dry_report.succeeded, live_report.succeeded);
        assert!(dry_report.dry_run);
        assert!(!live_report.dry_run);
        assert!(temp.path().join("x.jpg").exists());
    }

    #[test]
    fn failures_are_collected_and_the_batch_continues() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.jpg"), b"b").unwrap();
        let mut plan = OperationPlan::new(OperationKind::Rename);
        plan.actions.push(move_plan(temp.path(), "gone.jpg", "x.jpg"));
        plan.actions.push(move_plan(temp.path(), "b.jpg", "y.jpg"));

        let config = TidyConfig::builder(temp.path()).dry_run(false).build().unwrap();
        let (sender, receiver) = EventChannel::new();
        let report = apply_plan(&plan, &config, &sender);
        drop(sender);

        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].0.ends_with("gone.jpg"));
        assert!(receiver
            .iter()
            .any(|e| matches!(e, Event::Apply(ApplyEvent::Failed { .. }))));
    }

    #[test]
    fn cancelled_token_stops_applying() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.jpg"), b"a").unwrap();
        let mut plan = OperationPlan::new(OperationKind::Rename);
        plan.actions.push(move_plan(temp.path(), "a.jpg", "x.jpg"));

        let token = CancellationToken::new();
        token.cancel();
        let config = TidyConfig::builder(temp.path())
            .dry_run(false)
            .cancel_token(token)
            .build()
            .unwrap();
        let report = apply_plan(&plan, &config, &null_sender());

        assert!(report.cancelled);
        assert_eq!(report.attempted, 0);
        assert!(temp.path().join("a.jpg").exists());
    }

    #[test]
    fn deletes_are_gated_by_dry_run() {
        let temp = TempDir::new().unwrap();
        let overlay = temp.path().join("snap-overlay.png");
        fs::write(&overlay, b"o").unwrap();
        let mut plan = OperationPlan::new(OperationKind::DeleteOverlays);
        plan.actions.push(PlannedAction::Delete(overlay.clone()));

        let dry = TidyConfig::builder(temp.path()).build().unwrap();
        assert_eq!(apply_plan(&plan, &dry, &null_sender()).succeeded, 1);
        assert!(overlay.exists());

        let live = TidyConfig::builder(temp.path()).dry_run(false).build().unwrap();
        assert_eq!(apply_plan(&plan, &live, &null_sender()).succeeded, 1);
        assert!(!overlay.exists());
    }

    #[test]
    fn declined_step_is_not_applied_and_later_steps_run() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("chat")).unwrap();
        fs::write(temp.path().join("chat/1614834367890.jpg"), b"x").unwrap();
        fs::write(temp.path().join("1577836800000.mp4"), b"v").unwrap();
        let config = TidyConfig::builder(temp.path()).dry_run(false).build().unwrap();

        let mut seen = Vec::new();
        let reports = run_all_gated(&config, &null_sender(), |plan| {
            seen.push((plan.operation, plan.actions.len()));
            plan.operation != OperationKind::Flatten
        })
        .unwrap();

        assert_eq!(seen[0], (OperationKind::Flatten, 1));
        assert_eq!(seen[1], (OperationKind::Rename, 1));
        assert_eq!(seen.len(), 4);
        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| r.operation != OperationKind::Flatten));
        assert!(temp.path().join("chat/1614834367890.jpg").exists());
        assert!(temp.path().join("2020-01-01_1577836800000.mp4").exists());
    }

    #[test]
    fn staged_flatten_feeds_the_next_dry_run_step() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("chat")).unwrap();
        fs::write(temp.path().join("chat/1614834367890.jpg"), b"x").unwrap();
        let config = TidyConfig::builder(temp.path()).build().unwrap();

        let flatten = plan(OperationKind::Flatten, &config, &null_sender()).unwrap();
        let report = apply_plan(&flatten, &config, &null_sender());
        let mut pending = PendingChanges::new();
        stage(&mut pending, &flatten, &report, &config);

        assert!(pending.has_departed(&temp.path().join("chat")));
        let rename =
            plan_pending(OperationKind::Rename, &config, &pending, &null_sender()).unwrap();
        match rename.actions.as_slice() {
            [PlannedAction::Move(m)] => {
                assert_eq!(m.original_path, temp.path().join("1614834367890.jpg"));
                assert_eq!(m.final_name, "2021-03-04_1614834367890.jpg");
            }
            other => panic!("unexpected plan: {other:?}"),
        }
    }

    #[test]
    fn labels_are_kebab_case() {
        assert_eq!(OperationKind::DeleteOverlays.to_string(), "delete-overlays");
        assert_eq!(OperationKind::ALL_STEPS[0], OperationKind::Flatten);
    }
}
