//! Directory walking implementation using walkdir.

use super::{filter::EntryFilter, FileScanner, ScanResult};
use crate::error::ScanError;
use crate::events::{null_sender, Event, EventSender, ScanEvent};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Descend into subdirectories; when false only the root's own files are listed
    pub recursive: bool,
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Directories pruned from the walk
    pub exclude_dirs: Vec<PathBuf>,
}

impl ScanConfig {
    /// Walk the whole tree
    pub fn recursive() -> Self {
        Self {
            recursive: true,
            ..Default::default()
        }
    }

    /// List only the files directly inside the root
    pub fn top_level() -> Self {
        Self::default()
    }

    pub fn excluding(mut self, dir: impl Into<PathBuf>) -> Self {
        self.exclude_dirs.push(dir.into());
        self
    }

    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    pub fn with_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: EntryFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let filter = EntryFilter::new()
            .with_hidden(config.include_hidden)
            .with_excluded(config.exclude_dirs.clone());
        Self { config, filter }
    }

    fn walk(&self, root: &Path, events: &EventSender) -> Result<ScanResult, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();
        if !self.config.recursive {
            walker = walker.max_depth(1);
        }

        let mut result = ScanResult::default();

        for entry_result in walker.into_iter().filter_entry(|e| self.filter.keep(e)) {
            match entry_result {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let path = entry.into_path();
                    events.send(Event::Scan(ScanEvent::FileFound { path: path.clone() }));
                    result.files.push(path);
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    let error = if e.io_error().map(|io| io.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadEntry {
                            path: path.clone(),
                            source: std::io::Error::other(e.to_string()),
                        }
                    };

                    warn!(path = %path.display(), error = %error, "skipping unreadable entry");
                    events.send(Event::Scan(ScanEvent::Error {
                        path,
                        message: error.to_string(),
                    }));
                    result.errors.push(error);
                }
            }
        }

        result.files.sort();
        debug!(
            root = %root.display(),
            files = result.files.len(),
            errors = result.errors.len(),
            "scan finished"
        );
        Ok(result)
    }
}

impl FileScanner for WalkDirScanner {
    fn scan(&self, root: &Path) -> Result<ScanResult, ScanError> {
        self.scan_with_events(root, &null_sender())
    }

    fn scan_with_events(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        events.send(Event::Scan(ScanEvent::Started {
            root: root.to_path_buf(),
        }));

        let result = self.walk(root, events)?;

        events.send(Event::Scan(ScanEvent::Completed {
            total_files: result.files.len(),
        }));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn scan_empty_directory_returns_empty_vec() {
        let temp = TempDir::new().unwrap();
        let result = WalkDirScanner::new(ScanConfig::recursive())
            .scan(temp.path())
            .unwrap();

        assert!(result.files.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn recursive_scan_finds_nested_files_in_order() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("b.jpg"));
        touch(&temp.path().join("a/nested.mp4"));
        touch(&temp.path().join("a/deeper/c.png"));

        let result = WalkDirScanner::new(ScanConfig::recursive())
            .scan(temp.path())
            .unwrap();

        let relative: Vec<_> = result
            .files
            .iter()
            .map(|p| p.strip_prefix(temp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("a/deeper/c.png"),
                PathBuf::from("a/nested.mp4"),
                PathBuf::from("b.jpg"),
            ]
        );
    }

    #[test]
    fn top_level_scan_ignores_subdirectories() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("root.jpg"));
        touch(&temp.path().join("sub/child.jpg"));

        let result = WalkDirScanner::new(ScanConfig::top_level())
            .scan(temp.path())
            .unwrap();

        assert_eq!(result.files, vec![temp.path().join("root.jpg")]);
    }

    #[test]
    fn excluded_directory_is_not_scanned() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("keep.jpg"));
        touch(&temp.path().join("duplicates/keep.jpg"));

        let config = ScanConfig::recursive().excluding(temp.path().join("duplicates"));
        let result = WalkDirScanner::new(config).scan(temp.path()).unwrap();

        assert_eq!(result.files, vec![temp.path().join("keep.jpg")]);
    }

    #[test]
    fn scan_nonexistent_directory_returns_error() {
        let result = WalkDirScanner::new(ScanConfig::recursive())
            .scan(Path::new("/nonexistent/path/12345"));
        assert!(matches!(result, Err(ScanError::DirectoryNotFound { .. })));
    }
}
