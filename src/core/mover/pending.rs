//! Effects of plans that were previewed but not applied.

use super::{DestinationLedger, RenamePlan};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// The tree as earlier previewed plans would have left it.
///
/// A dry-run moves nothing, so a later step scanning the disk would still see
/// the tree from before the batch. Recording each previewed plan here lets
/// the next step list files and test names as if those plans had run. File
/// bytes are still read from where they are now, via [`content_path`].
///
/// [`content_path`]: PendingChanges::content_path
#[derive(Debug, Clone, Default)]
pub struct PendingChanges {
    /// Path a file would have -> where its bytes are now
    arrived: BTreeMap<PathBuf, PathBuf>,
    /// Paths that would no longer exist
    departed: HashSet<PathBuf>,
}

impl PendingChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.arrived.is_empty() && self.departed.is_empty()
    }

    pub fn record_move(&mut self, plan: &RenamePlan) {
        let content = self.content_path(&plan.original_path).to_path_buf();
        self.arrived.remove(&plan.original_path);
        self.departed.insert(plan.original_path.clone());

        let destination = plan.destination();
        self.departed.remove(&destination);
        self.arrived.insert(destination, content);
    }

    /// `path` is a deleted file or a removed directory
    pub fn record_removal(&mut self, path: &Path) {
        self.arrived.remove(path);
        self.departed.insert(path.to_path_buf());
    }

    pub fn has_departed(&self, path: &Path) -> bool {
        self.departed.contains(path)
    }

    /// Whether a file would arrive somewhere under `dir`
    pub fn has_arrivals_under(&self, dir: &Path) -> bool {
        self.arrived.keys().any(|p| p.starts_with(dir))
    }

    /// Where the bytes of the file that would be at `path` can be read
    pub fn content_path<'a>(&'a self, path: &'a Path) -> &'a Path {
        self.arrived.get(path).map_or(path, PathBuf::as_path)
    }

    /// Turn a scan of the disk into the listing the same scan would give
    /// after the pending changes. Arrivals are added when `in_scope` accepts
    /// them. The result is sorted.
    pub fn overlay(&self, scanned: Vec<PathBuf>, in_scope: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
        if self.is_empty() {
            return scanned;
        }
        let mut files: Vec<PathBuf> = scanned
            .into_iter()
            .filter(|p| !self.departed.contains(p))
            .collect();
        files.extend(self.arrived.keys().filter(|p| in_scope(p)).cloned());
        files.sort();
        files.dedup();
        files
    }

    /// A ledger that starts from the pending state rather than the bare disk
    pub fn ledger(&self) -> DestinationLedger {
        let mut ledger = DestinationLedger::new();
        for path in &self.departed {
            ledger.vacate(path.clone());
        }
        for path in self.arrived.keys() {
            ledger.claim(path.clone());
        }
        ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::fs;
    use tempfile::TempDir;

    fn rename(from: &Path, dir: &Path, name: &str) -> RenamePlan {
        RenamePlan {
            original_path: from.to_path_buf(),
            destination_dir: dir.to_path_buf(),
            proposed_name: OsString::from(name),
            final_name: OsString::from(name),
        }
    }

    #[test]
    fn chained_moves_keep_the_original_bytes() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("a/x.jpg"), b"x").unwrap();

        let mut pending = PendingChanges::new();
        pending.record_move(&rename(&root.join("a/x.jpg"), root, "x.jpg"));
        pending.record_move(&rename(&root.join("x.jpg"), root, "2020-01-01_x.jpg"));

        let dated = root.join("2020-01-01_x.jpg");
        assert_eq!(pending.content_path(&dated), root.join("a/x.jpg"));
        assert!(pending.has_departed(&root.join("x.jpg")));

        let listing = pending.overlay(vec![root.join("a/x.jpg")], |_| true);
        assert_eq!(listing, vec![dated.clone()]);
        assert!(pending.has_arrivals_under(root));
        assert!(!pending.has_arrivals_under(&root.join("a")));
    }

    #[test]
    fn ledger_sees_arrivals_and_departures() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("a/x.jpg"), b"x").unwrap();

        let mut pending = PendingChanges::new();
        pending.record_move(&rename(&root.join("a/x.jpg"), root, "x.jpg"));
        let ledger = pending.ledger();

        assert!(ledger.is_occupied(&root.join("x.jpg")));
        assert!(!ledger.is_occupied(&root.join("a/x.jpg")));
    }

    #[test]
    fn removal_drops_a_file_from_the_listing() {
        let temp = TempDir::new().unwrap();
        let overlay = temp.path().join("a-overlay.png");

        let mut pending = PendingChanges::new();
        pending.record_removal(&overlay);

        assert!(pending.overlay(vec![overlay.clone()], |_| true).is_empty());
    }
}
