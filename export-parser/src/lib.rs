//! Reads timeline export files.
//!
//! An export file is a script that assigns a JSON array to a variable:
//!
//! ```text
//! BackupData.plurks["2024_01"] = [{"posted": "Mon, 01 Jan 2024 12:00:00 GMT", ...}];
//! ```
//!
//! Everything after the first `=` is the payload. A trailing `;` is dropped and the
//! rest is parsed as JSON that may carry raw control characters inside strings.

mod payload;

use archive_core::{ExportError, ExportRecord};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

pub use payload::escape_control_chars;

const UTF8_BOM: &str = "\u{feff}";

#[derive(Debug, Default, Deserialize)]
struct RawEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    posted: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    content: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    content_raw: Option<String>,
}

/// Non-string values are treated as if the field were absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

impl From<RawEntry> for ExportRecord {
    fn from(entry: RawEntry) -> Self {
        ExportRecord::new(entry.posted, entry.content, entry.content_raw)
    }
}

/// Parses one export file, yielding no records when the file cannot be read or parsed.
pub fn parse_export(path: &Path) -> Vec<ExportRecord> {
    match try_parse_export(path) {
        Ok(records) => records,
        Err(e) => {
            warn!("Skipping export file: {}", e);
            Vec::new()
        }
    }
}

/// Like [`parse_export`] but reports why a file yielded nothing.
pub fn try_parse_export(path: &Path) -> Result<Vec<ExportRecord>, ExportError> {
    let bytes = std::fs::read(path).map_err(|e| ExportError::Unreadable {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;
    let text = String::from_utf8(bytes).map_err(|_| ExportError::Encoding {
        path: path.to_path_buf(),
    })?;
    parse_payload(&text, path)
}

/// Parses the text of an export file. `path` is only used in error reports.
pub fn parse_payload(text: &str, path: &Path) -> Result<Vec<ExportRecord>, ExportError> {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text).trim();

    let Some(eq_index) = text.find('=') else {
        return Err(ExportError::MissingAssignment {
            path: path.to_path_buf(),
        });
    };

    let mut json_part = text[eq_index + 1..].trim();
    if let Some(stripped) = json_part.strip_suffix(';') {
        json_part = stripped.trim();
    }

    let sanitized = escape_control_chars(json_part);
    let document: Value =
        serde_json::from_str(&sanitized).map_err(|e| ExportError::MalformedPayload {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;

    let Value::Array(items) = document else {
        return Err(ExportError::NotAnArray {
            path: path.to_path_buf(),
        });
    };

    let total = items.len();
    let records: Vec<ExportRecord> = items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value::<RawEntry>(item).ok())
        .map(ExportRecord::from)
        .collect();

    debug!(
        "Parsed {} records ({} entries) from {}",
        records.len(),
        total,
        path.display()
    );
    Ok(records)
}
