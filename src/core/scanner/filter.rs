//! Entry filtering for the directory walk.

use std::path::{Path, PathBuf};
use walkdir::DirEntry;

/// Decides which walk entries are descended into or reported
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Directories pruned from the walk, compared by full path
    excluded_dirs: Vec<PathBuf>,
    /// Whether to include hidden files and directories
    include_hidden: bool,
}

impl EntryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Prune these directories and everything below them
    pub fn with_excluded(mut self, dirs: Vec<PathBuf>) -> Self {
        self.excluded_dirs = dirs;
        self
    }

    /// Whether the walk should yield or descend into `entry`.
    ///
    /// The walk root itself is always kept, even when its own name is hidden.
    pub fn keep(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        if !self.include_hidden && is_hidden(entry.path()) {
            return false;
        }
        if entry.file_type().is_dir() && self.is_excluded(entry.path()) {
            return false;
        }
        true
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.excluded_dirs.iter().any(|dir| dir == path)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use walkdir::WalkDir;

    fn kept_names(root: &Path, filter: &EntryFilter) -> Vec<String> {
        let mut names: Vec<String> = WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| filter.keep(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.depth() > 0)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn hidden_entries_dropped_by_default() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("visible.jpg"), b"a").unwrap();
        fs::write(temp.path().join(".DS_Store"), b"b").unwrap();

        let names = kept_names(temp.path(), &EntryFilter::new());
        assert_eq!(names, vec!["visible.jpg"]);

        let names = kept_names(temp.path(), &EntryFilter::new().with_hidden(true));
        assert_eq!(names, vec![".DS_Store", "visible.jpg"]);
    }

    #[test]
    fn excluded_directory_is_pruned() {
        let temp = TempDir::new().unwrap();
        let quarantine = temp.path().join("duplicates");
        fs::create_dir(&quarantine).unwrap();
        fs::write(quarantine.join("old.jpg"), b"a").unwrap();
        fs::write(temp.path().join("new.jpg"), b"b").unwrap();

        let filter = EntryFilter::new().with_excluded(vec![quarantine]);
        assert_eq!(kept_names(temp.path(), &filter), vec!["new.jpg"]);
    }
}
