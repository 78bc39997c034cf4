//! Shorten dated names to `YYYY-MM-DD-NNN.ext`.

use super::{OperationKind, OperationPlan, PlannedAction};
use crate::core::config::TidyConfig;
use crate::core::mover::{PendingChanges, RenamePlan};
use crate::core::scanner::{FileScanner, ScanConfig, WalkDirScanner};
use crate::error::TidyError;
use crate::events::EventSender;
use regex::Regex;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static DATED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})[-_](\d{2})[-_](\d{2})[-_]").expect("valid regex"));

/// Next sequence number per date, for one shorten run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceCounters {
    per_date: BTreeMap<String, u32>,
}

impl SequenceCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next number for `date`, starting at 1
    pub fn next(&mut self, date: &str) -> u32 {
        let seq = self.per_date.entry(date.to_string()).or_insert(0);
        *seq += 1;
        *seq
    }

    /// Highest number handed out for `date`
    pub fn last(&self, date: &str) -> Option<u32> {
        self.per_date.get(date).copied()
    }

    pub fn dates(&self) -> impl Iterator<Item = (&str, u32)> {
        self.per_date.iter().map(|(d, s)| (d.as_str(), *s))
    }
}

/// `2018-04-27`, 3, `JPG` -> `2018-04-27-003.jpg`
pub fn shortened_name(date: &str, seq: u32, extension: Option<&str>) -> String {
    match extension {
        Some(ext) => format!("{date}-{seq:03}.{}", ext.to_lowercase()),
        None => format!("{date}-{seq:03}"),
    }
}

/// Plan shortening every root file whose name starts with a date.
///
/// Numbers are handed out per date in sorted filename order. When a target
/// is taken the number is bumped for that file only.
pub fn plan_shorten(
    config: &TidyConfig,
    events: &EventSender,
) -> Result<(OperationPlan, SequenceCounters), TidyError> {
    plan_shorten_pending(config, &PendingChanges::new(), events)
}

pub(super) fn plan_shorten_pending(
    config: &TidyConfig,
    pending: &PendingChanges,
    events: &EventSender,
) -> Result<(OperationPlan, SequenceCounters), TidyError> {
    let scanner = WalkDirScanner::new(
        ScanConfig::top_level()
            .with_hidden(config.include_hidden)
            .with_symlinks(config.follow_symlinks),
    );
    let scanned = scanner.scan_with_events(&config.root, events)?;
    let files = pending.overlay(scanned.files, |p| p.parent() == Some(config.root.as_path()));

    let mut plan = OperationPlan::new(OperationKind::Shorten);
    plan.errors
        .extend(scanned.errors.iter().map(ToString::to_string));

    let mut counters = SequenceCounters::new();
    let mut ledger = pending.ledger();

    for file in files {
        let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
            debug!(path = %file.display(), "name is not UTF-8");
            plan.skipped.push(file);
            continue;
        };
        let Some(caps) = DATED_NAME.captures(name) else {
            continue;
        };
        let date = format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]);
        let extension = Path::new(name).extension().and_then(|e| e.to_str());

        let seq = counters.next(&date);
        let proposed = shortened_name(&date, seq, extension);

        let mut target = proposed.clone();
        let mut bump = 0;
        while target != name && ledger.is_occupied(&config.root.join(&target)) {
            bump += 1;
            target = shortened_name(&date, seq + bump, extension);
        }

        if target == name {
            debug!(path = %file.display(), "already shortened");
            plan.skipped.push(file);
            continue;
        }

        ledger.claim(config.root.join(&target));
        ledger.vacate(file.clone());
        plan.actions.push(PlannedAction::Move(RenamePlan {
            original_path: file,
            destination_dir: config.root.clone(),
            proposed_name: OsString::from(proposed),
            final_name: OsString::from(target),
        }));
    }

    Ok((plan, counters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::operations::apply_plan;
    use crate::events::null_sender;
    use std::fs;
    use tempfile::TempDir;

    fn names(plan: &OperationPlan) -> Vec<String> {
        plan.actions
            .iter()
            .filter_map(|a| match a {
                PlannedAction::Move(m) => Some(m.final_name.to_string_lossy().into_owned()),
                PlannedAction::Delete(_) => None,
            })
            .collect()
    }

    #[test]
    fn same_date_counts_up() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("2018-04-27_IMG001.JPG"), b"1").unwrap();
        fs::write(temp.path().join("2018-04-27_IMG002.JPG"), b"2").unwrap();
        fs::write(temp.path().join("2019_01_02_clip.MP4"), b"3").unwrap();
        fs::write(temp.path().join("undated.jpg"), b"4").unwrap();
        let config = TidyConfig::builder(temp.path()).build().unwrap();

        let (plan, counters) = plan_shorten(&config, &null_sender()).unwrap();

        assert_eq!(
            names(&plan),
            vec!["2018-04-27-001.jpg", "2018-04-27-002.jpg", "2019-01-02-001.mp4"]
        );
        assert_eq!(counters.last("2018-04-27"), Some(2));
        assert_eq!(counters.last("2019-01-02"), Some(1));
        assert_eq!(counters.last("2020-01-01"), None);
    }

    #[test]
    fn taken_target_bumps_sequence_locally() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("2018-04-27-001.jpg"), b"kept").unwrap();
        fs::write(temp.path().join("2018-04-27_b.jpg"), b"b").unwrap();
        let config = TidyConfig::builder(temp.path()).build().unwrap();

        let (plan, _) = plan_shorten(&config, &null_sender()).unwrap();

        // "2018-04-27-001.jpg" takes seq 1 and already has its target name.
        // "2018-04-27_b.jpg" takes seq 2.
        assert_eq!(names(&plan), vec!["2018-04-27-002.jpg"]);
        assert_eq!(plan.skipped.len(), 1);
    }

    #[test]
    fn occupied_target_bumps_only_that_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("2018-04-27_a.jpg"), b"a").unwrap();
        fs::write(temp.path().join("2018-04-27_b.jpg"), b"b").unwrap();
        fs::write(temp.path().join("2018-04-27_c.jpg"), b"c").unwrap();
        fs::create_dir(temp.path().join("2018-04-27-002.jpg")).unwrap();
        let config = TidyConfig::builder(temp.path()).dry_run(false).build().unwrap();

        let (plan, counters) = plan_shorten(&config, &null_sender()).unwrap();
        // b bumps past the directory to 003; the counter itself does not
        // move, so c (seq 3) then collides with b and bumps to 004.
        assert_eq!(
            names(&plan),
            vec!["2018-04-27-001.jpg", "2018-04-27-003.jpg", "2018-04-27-004.jpg"]
        );
        assert_eq!(counters.last("2018-04-27"), Some(3));

        let report = apply_plan(&plan, &config, &null_sender());
        assert_eq!(report.succeeded, 3);
        assert!(temp.path().join("2018-04-27-001.jpg").is_file());
        assert!(temp.path().join("2018-04-27-002.jpg").is_dir());
        assert!(temp.path().join("2018-04-27-004.jpg").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_are_skipped_not_dropped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = TempDir::new().unwrap();
        let odd = temp.path().join(OsStr::from_bytes(b"2018-04-27_\xff.jpg"));
        fs::write(&odd, b"x").unwrap();
        fs::write(temp.path().join("2018-04-27_a.jpg"), b"a").unwrap();
        let config = TidyConfig::builder(temp.path()).build().unwrap();

        let (plan, _) = plan_shorten(&config, &null_sender()).unwrap();

        assert_eq!(names(&plan), vec!["2018-04-27-001.jpg"]);
        assert_eq!(plan.skipped, vec![odd]);
    }

    #[test]
    fn extensionless_names() {
        assert_eq!(shortened_name("2020-01-01", 7, None), "2020-01-01-007");
        assert_eq!(shortened_name("2020-01-01", 1000, Some("HEIC")), "2020-01-01-1000.heic");
    }
}
