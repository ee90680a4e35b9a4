use chrono::{DateTime, Datelike, Utc};

use crate::domain::PhotoRecord;
use crate::error::InvalidTimestamp;

/// Capture time of a record, if it has one that parses.
pub fn capture_date(record: &PhotoRecord) -> Option<DateTime<Utc>> {
    record
        .capture_info
        .as_ref()
        .and_then(|info| info.date_taken.as_ref())
        .and_then(|ts| ts.valid())
}

/// The single date used to place a record in time: capture time when valid,
/// falling back to upload time.
pub fn effective_date(record: &PhotoRecord) -> Result<DateTime<Utc>, InvalidTimestamp> {
    if let Some(taken) = capture_date(record) {
        return Ok(taken);
    }

    record.upload_at.valid().ok_or_else(|| InvalidTimestamp {
        id: record.id.clone(),
        upload_at: record.upload_at.to_string(),
    })
}

/// Canonical "YYYY-MM" bucket key.
pub fn year_month_key(date: &DateTime<Utc>) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}
