//! # Date Module
//!
//! Assigns every file a canonical timestamp.
//!
//! ## Evidence, in priority order
//! 1. A 13-digit millisecond epoch at the start of the filename, accepted for
//!    years 2000-2030 (exports name files `1468516444000_image.jpg`)
//! 2. EXIF capture tags, for JPEG/PNG/WebP/HEIC only
//! 3. Filesystem birth time, else modification time
//! 4. The current time, logged as a warning
//!
//! Each step returns `Option`; resolution never fails.

mod capture;

pub use capture::DateTag;

use crate::core::scanner::ImageFormat;
use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use std::time::SystemTime;
use tracing::{debug, warn};

static EPOCH_MILLIS_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{13})").expect("valid regex"));

static DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}[-_]\d{2}[-_]\d{2}").expect("valid regex"));

/// Filename timestamps outside this range are treated as unrelated numbers
const PLAUSIBLE_YEARS: std::ops::RangeInclusive<i32> = 2000..=2030;

/// Where a resolved date came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateSource {
    FilenameTimestamp,
    Metadata(DateTag),
    FileCreated,
    FileModified,
    /// Nothing usable; wall-clock time at resolution
    Fallback,
}

/// A canonical timestamp and the evidence behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDate {
    pub timestamp: DateTime<Utc>,
    pub source: DateSource,
}

impl ResolvedDate {
    fn new(timestamp: DateTime<Utc>, source: DateSource) -> Self {
        Self { timestamp, source }
    }

    /// `YYYY-MM-DD_` filename prefix
    pub fn prefix(&self) -> String {
        format_prefix(&self.timestamp)
    }
}

/// Resolves the canonical date of a file
#[derive(Debug, Clone, Copy, Default)]
pub struct DateResolver;

impl DateResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the best-guess date for `path`. Never fails.
    pub fn resolve(&self, path: &Path) -> ResolvedDate {
        self.resolve_from(path, path)
    }

    /// Resolve the date of a file named like `path` whose bytes are at
    /// `content`. Only the filename step looks at `path`.
    pub fn resolve_from(&self, path: &Path, content: &Path) -> ResolvedDate {
        let resolved = from_filename(path)
            .or_else(|| from_metadata(content))
            .or_else(|| from_filesystem(content));

        match resolved {
            Some(date) => {
                debug!(path = %path.display(), source = ?date.source, date = %date.timestamp, "resolved date");
                date
            }
            None => {
                warn!(path = %path.display(), "could not determine date, using current time");
                ResolvedDate::new(Utc::now(), DateSource::Fallback)
            }
        }
    }
}

fn from_filename(path: &Path) -> Option<ResolvedDate> {
    let name = path.file_name()?.to_str()?;
    let digits = EPOCH_MILLIS_PREFIX.captures(name)?.get(1)?.as_str();
    let millis: i64 = digits.parse().ok()?;
    let timestamp = DateTime::from_timestamp_millis(millis)?;

    PLAUSIBLE_YEARS
        .contains(&timestamp.year())
        .then(|| ResolvedDate::new(timestamp, DateSource::FilenameTimestamp))
}

fn from_metadata(path: &Path) -> Option<ResolvedDate> {
    if !ImageFormat::from_path(path).carries_metadata() {
        return None;
    }
    let exif = capture::read_exif(path)?;
    let (tag, timestamp) = capture::capture_date(&exif)?;
    Some(ResolvedDate::new(timestamp, DateSource::Metadata(tag)))
}

fn from_filesystem(path: &Path) -> Option<ResolvedDate> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to stat file for date");
            return None;
        }
    };

    let created = metadata
        .created()
        .ok()
        .filter(|t| *t != SystemTime::UNIX_EPOCH)
        .map(|t| ResolvedDate::new(t.into(), DateSource::FileCreated));

    created.or_else(|| {
        metadata
            .modified()
            .ok()
            .map(|t| ResolvedDate::new(t.into(), DateSource::FileModified))
    })
}

/// Render `YYYY-MM-DD_` from the UTC calendar fields of `date`
pub fn format_prefix(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d_").to_string()
}

/// Whether `name` already starts with `YYYY-MM-DD` (hyphen or underscore separated)
pub fn has_date_prefix(name: &str) -> bool {
    DATE_PREFIX.is_match(name)
}
