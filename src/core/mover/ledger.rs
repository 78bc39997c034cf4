//! Per-batch view of which destination names are taken.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Tracks names claimed and vacated by earlier plans in the same batch.
///
/// Planning a whole batch before applying it means the filesystem alone no
/// longer tells the truth: a dry-run never creates `a_copy1.jpg`, and two
/// records planned back to back would both see it as free. The ledger
/// overlays the batch's own decisions on top of what is on disk, so dry-run
/// and live runs make identical choices. All claims for one batch go
/// through one `&mut DestinationLedger`, which serializes them.
#[derive(Debug, Default)]
pub struct DestinationLedger {
    claimed: HashSet<PathBuf>,
    vacated: HashSet<PathBuf>,
}

impl DestinationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `path` is unavailable as a destination
    pub fn is_occupied(&self, path: &Path) -> bool {
        if self.claimed.contains(path) {
            return true;
        }
        !self.vacated.contains(path) && exists_on_disk(path)
    }

    /// Record that an earlier plan will create `path`
    pub fn claim(&mut self, path: PathBuf) {
        self.vacated.remove(&path);
        self.claimed.insert(path);
    }

    /// Record that an earlier plan will move `path` away
    pub fn vacate(&mut self, path: PathBuf) {
        self.claimed.remove(&path);
        self.vacated.insert(path);
    }

    /// Number of destinations claimed so far
    pub fn claimed_count(&self) -> usize {
        self.claimed.len()
    }
}

/// `symlink_metadata` so that a dangling symlink still counts as taken.
pub(crate) fn exists_on_disk(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
