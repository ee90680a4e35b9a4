//! Free-text matching shared by every place that filters the collection.
//!
//! A query is matched as a case-insensitive substring against, in order:
//! title, description, tag names, camera, location text, the capture
//! year-month key and finally the upload year-month key. Both year-month keys
//! are tried, so a photo is found by the month it was taken *or* the month it
//! was uploaded. Substring semantics mean `"2024-1"` also hits `2024-10`
//! through `2024-12`.

use crate::domain::PhotoRecord;
use crate::timestamp::{capture_date, year_month_key};

/// Whether `record` matches the free-text `query`. Blank queries match everything.
pub fn matches(record: &PhotoRecord, query: &str) -> bool {
    let needle = query.trim();
    if needle.is_empty() {
        return true;
    }
    matches_normalized(record, &needle.to_lowercase())
}

/// Records matching `query`, in input order.
pub fn filter<'a>(records: &'a [PhotoRecord], query: &str) -> Vec<&'a PhotoRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records.iter().collect();
    }
    records
        .iter()
        .filter(|r| matches_normalized(r, &needle))
        .collect()
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn matches_normalized(record: &PhotoRecord, needle: &str) -> bool {
    let text_hit = |field: Option<&String>| field.is_some_and(|s| contains(s, needle));
    let info = record.capture_info.as_ref();

    text_hit(record.title.as_ref())
        || text_hit(record.description.as_ref())
        || record.tags.iter().any(|t| contains(&t.name, needle))
        || text_hit(info.and_then(|i| i.camera.as_ref()))
        || text_hit(info.and_then(|i| i.location.as_ref()))
        || capture_date(record).is_some_and(|d| year_month_key(&d).contains(needle))
        || record
            .upload_at
            .valid()
            .is_some_and(|d| year_month_key(&d).contains(needle))
}
