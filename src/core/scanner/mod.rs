//! # Scanner Module
//!
//! Enumerates the files an operation works on.
//!
//! Two shapes are needed: a recursive walk that skips the quarantine
//! directory (flatten, duplicates, overlays) and a flat listing of the root
//! only (rename, shorten). Both return regular files in sorted path order so
//! that plans are reproducible between a dry-run and the real run.
//!
//! ## Example
//! ```rust,ignore
//! use media_tidy::core::scanner::{FileScanner, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::recursive().excluding(root.join("duplicates")));
//! let files = scanner.scan(&root)?.files;
//! ```

mod filter;
mod walker;

pub use filter::EntryFilter;
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Image formats whose embedded metadata is consulted for a capture date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Heic,
    Unknown,
}

impl ImageFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "png" => ImageFormat::Png,
            "webp" => ImageFormat::WebP,
            "heic" => ImageFormat::Heic,
            _ => ImageFormat::Unknown,
        }
    }

    /// Detect format from a path's extension
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(ImageFormat::Unknown)
    }

    /// Whether EXIF may be present in this container
    pub fn carries_metadata(&self) -> bool {
        !matches!(self, ImageFormat::Unknown)
    }
}

/// Result of a scan operation
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Regular files found, sorted by path
    pub files: Vec<PathBuf>,
    /// Entries that could not be read (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Directory-tree enumerator used by every operation
pub trait FileScanner: Send + Sync {
    /// Enumerate `root` without progress reporting
    fn scan(&self, root: &Path) -> Result<ScanResult, ScanError>;

    /// Enumerate `root`, reporting each file through `events`
    fn scan_with_events(&self, root: &Path, events: &EventSender)
        -> Result<ScanResult, ScanError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_format_ignores_case() {
        assert_eq!(ImageFormat::from_extension("JPG"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("jpeg"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("HEIC"), ImageFormat::Heic);
        assert_eq!(ImageFormat::from_extension("webp"), ImageFormat::WebP);
    }

    #[test]
    fn videos_carry_no_metadata() {
        assert!(!ImageFormat::from_path(Path::new("clip.mp4")).carries_metadata());
        assert!(!ImageFormat::from_path(Path::new("no_extension")).carries_metadata());
        assert!(ImageFormat::from_path(Path::new("snap.png")).carries_metadata());
    }
}
