use crate::error::ExportError;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::ops::{Add, AddAssign};
use std::path::Path;

/// Format of the `posted` field in timeline exports, e.g. `Mon, 01 Jan 2024 12:00:00 GMT`.
pub const POSTED_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// The part of [`POSTED_FORMAT`] after the weekday name.
const POSTED_DATE_FORMAT: &str = " %d %b %Y %H:%M:%S GMT";

const WEEKDAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Format of day folders under the output root.
pub const DAY_FOLDER_FORMAT: &str = "%Y-%m-%d";

/// Parses an export `posted` value into a UTC instant with second precision.
///
/// The weekday must be a valid abbreviation but is not checked against the date.
/// Surrounding whitespace is rejected.
pub fn parse_posted(value: &str) -> Result<DateTime<Utc>, ExportError> {
    let invalid = || ExportError::InvalidTimestamp {
        value: value.to_string(),
    };

    let (weekday, date) = value.split_once(',').ok_or_else(invalid)?;
    if !WEEKDAY_NAMES
        .iter()
        .any(|name| weekday.eq_ignore_ascii_case(name))
    {
        return Err(invalid());
    }

    NaiveDateTime::parse_from_str(date, POSTED_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| invalid())
}

/// One post or response entry from an export file.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRecord {
    pub posted_at: Option<String>,
    pub content: Option<String>,
    pub content_raw: Option<String>,
    pub parsed_timestamp: Option<DateTime<Utc>>,
}

impl ExportRecord {
    pub fn new(
        posted_at: Option<String>,
        content: Option<String>,
        content_raw: Option<String>,
    ) -> Self {
        let parsed_timestamp = posted_at
            .as_deref()
            .and_then(|value| parse_posted(value).ok());
        Self {
            posted_at,
            content,
            content_raw,
            parsed_timestamp,
        }
    }

    /// The record's timestamp, or why it has none. Absent and malformed
    /// `posted` values are reported the same way.
    pub fn timestamp(&self) -> Result<DateTime<Utc>, ExportError> {
        self.parsed_timestamp
            .ok_or_else(|| ExportError::InvalidTimestamp {
                value: self.posted_at.clone().unwrap_or_default(),
            })
    }

    /// `content` and `content_raw` joined by a single space, absent fields as empty.
    pub fn combined_text(&self) -> String {
        format!(
            "{} {}",
            self.content.as_deref().unwrap_or_default(),
            self.content_raw.as_deref().unwrap_or_default()
        )
    }

    /// Day folder name (`YYYY-MM-DD`) for this record, if it has a timestamp.
    pub fn day_folder(&self) -> Option<String> {
        self.parsed_timestamp
            .map(|ts| ts.format(DAY_FOLDER_FORMAT).to_string())
    }
}

/// Brings an image's embedded capture time in line with its post time.
///
/// Implementations are best-effort: `true` means the file was rewritten, `false`
/// covers both "already correct" and "could not be updated".
pub trait TimestampReconciler: Send + Sync {
    fn reconcile_timestamp(&self, path: &Path, target: DateTime<Utc>) -> bool;
}

/// Result of one fetch-or-skip attempt for a single URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    pub downloaded: bool,
    pub already_existed: bool,
    pub metadata_updated: bool,
}

impl FetchOutcome {
    pub fn downloaded(metadata_updated: bool) -> Self {
        Self {
            downloaded: true,
            already_existed: false,
            metadata_updated,
        }
    }

    pub fn existing(metadata_updated: bool) -> Self {
        Self {
            downloaded: false,
            already_existed: true,
            metadata_updated,
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }
}

/// Per-source tally of fetch outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub downloaded: u64,
    pub skipped_existing: u64,
    pub metadata_updated: u64,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: FetchOutcome) {
        if outcome.downloaded {
            self.downloaded += 1;
        }
        if outcome.already_existed {
            self.skipped_existing += 1;
        }
        if outcome.metadata_updated {
            self.metadata_updated += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Add for RunCounters {
    type Output = RunCounters;

    fn add(self, rhs: Self) -> Self::Output {
        RunCounters {
            downloaded: self.downloaded + rhs.downloaded,
            skipped_existing: self.skipped_existing + rhs.skipped_existing,
            metadata_updated: self.metadata_updated + rhs.metadata_updated,
        }
    }
}

impl AddAssign for RunCounters {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_posted() {
        let ts = parse_posted("Mon, 01 Jan 2024 12:00:00 GMT").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 1, 1));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (12, 0, 0));
    }

    #[test]
    fn test_parse_posted_rejects_garbage() {
        assert!(matches!(
            parse_posted("not a date"),
            Err(ExportError::InvalidTimestamp { .. })
        ));
        assert!(parse_posted("").is_err());
        assert!(parse_posted("Xyz, 01 Jan 2024 12:00:00 GMT").is_err());
        assert!(parse_posted("Monday, 01 Jan 2024 12:00:00 GMT").is_err());
    }

    #[test]
    fn test_parse_posted_ignores_weekday_mismatch() {
        // 2024-01-01 was a Monday.
        let ts = parse_posted("Tue, 01 Jan 2024 12:00:00 GMT").unwrap();
        assert_eq!(ts, parse_posted("Mon, 01 Jan 2024 12:00:00 GMT").unwrap());
        assert!(parse_posted("mon, 01 Jan 2024 12:00:00 GMT").is_ok());
    }

    #[test]
    fn test_parse_posted_rejects_surrounding_whitespace() {
        assert!(parse_posted(" Mon, 01 Jan 2024 12:00:00 GMT").is_err());
        assert!(parse_posted("Mon, 01 Jan 2024 12:00:00 GMT ").is_err());
        assert!(parse_posted("Mon, 01 Jan 2024 12:00:00 GMT\n").is_err());
    }

    #[test]
    fn test_record_without_posted() {
        let record = ExportRecord::new(None, Some("hello".to_string()), None);
        assert!(record.parsed_timestamp.is_none());
        assert!(record.timestamp().is_err());
        assert_eq!(record.day_folder(), None);
    }

    #[test]
    fn test_record_day_folder_and_text() {
        let record = ExportRecord::new(
            Some("Sun, 31 Dec 2023 23:59:59 GMT".to_string()),
            None,
            Some("raw".to_string()),
        );
        assert_eq!(record.day_folder().as_deref(), Some("2023-12-31"));
        assert_eq!(record.combined_text(), " raw");
    }

    #[test]
    fn test_counters_record_and_sum() {
        let mut plurks = RunCounters::new();
        plurks.record(FetchOutcome::downloaded(true));
        plurks.record(FetchOutcome::existing(false));
        plurks.record(FetchOutcome::failed());

        let mut responses = RunCounters::new();
        responses.record(FetchOutcome::existing(true));

        let total = plurks + responses;
        assert_eq!(total.downloaded, 1);
        assert_eq!(total.skipped_existing, 2);
        assert_eq!(total.metadata_updated, 2);
        assert!(RunCounters::new().is_empty());
    }
}
