//! EXIF capture-date extraction.
//!
//! EXIF date format is `YYYY:MM:DD HH:MM:SS`. The colons in the date part are
//! turned into hyphens before parsing so that the ISO-ish variants some
//! exporters write are accepted too. EXIF carries no zone, so naive values
//! are read as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use exif::{Exif, In, Reader, Tag, Value};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static EXIF_DATE_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}):(\d{2}):(\d{2})").expect("valid regex"));

/// Date tags consulted, in order of preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateTag {
    /// When the shutter fired
    DateTimeOriginal,
    /// Last modification recorded by the camera or editor
    DateTime,
    /// When the image was digitized (QuickTime/XMP "CreateDate")
    DateTimeDigitized,
}

impl DateTag {
    pub const PREFERENCE: [DateTag; 3] = [
        DateTag::DateTimeOriginal,
        DateTag::DateTime,
        DateTag::DateTimeDigitized,
    ];

    fn tag(self) -> Tag {
        match self {
            DateTag::DateTimeOriginal => Tag::DateTimeOriginal,
            DateTag::DateTime => Tag::DateTime,
            DateTag::DateTimeDigitized => Tag::DateTimeDigitized,
        }
    }
}

/// Read the EXIF block from a JPEG, PNG, WebP or HEIF container.
pub(crate) fn read_exif(path: &Path) -> Option<Exif> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => Some(exif),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no usable EXIF block");
            None
        }
    }
}

/// First tag in [`DateTag::PREFERENCE`] whose value parses to a valid date.
pub(crate) fn capture_date(exif: &Exif) -> Option<(DateTag, DateTime<Utc>)> {
    DateTag::PREFERENCE.into_iter().find_map(|date_tag| {
        let field = exif.get_field(date_tag.tag(), In::PRIMARY)?;
        let text = ascii_value(&field.value)?;
        parse_exif_datetime(&text).map(|date| (date_tag, date))
    })
}

/// Parse an EXIF-style timestamp.
pub(crate) fn parse_exif_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = EXIF_DATE_PART.replace(raw.trim(), "$1-$2-$3");
    let s = normalized.as_ref();

    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Helper to extract a non-empty string from an EXIF ASCII value
fn ascii_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        let bytes = vec.first()?;
        let s = std::str::from_utf8(bytes).ok()?;
        let trimmed = s.trim_end_matches('\0').trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    None
}
