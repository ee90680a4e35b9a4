pub mod browse;
pub mod facets;
pub mod ls;
pub mod rm;
pub mod status;
pub mod timeline;
pub mod upload;

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use photoshelf_core::domain::PhotoRecord;
use photoshelf_core::timestamp::effective_date;

const SHORT_ID_LEN: usize = 12;

pub(crate) fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.to_vec());
    table
}

/// Content hashes are long; the first few characters identify a photo.
pub(crate) fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Effective date as `YYYY-MM-DD`, or a dash when the record has none.
pub(crate) fn display_date(record: &PhotoRecord) -> String {
    effective_date(record)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| "\u{2014}".to_string())
}

pub(crate) fn display_tags(record: &PhotoRecord) -> String {
    record
        .tags
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn display_title(record: &PhotoRecord) -> &str {
    record.title.as_deref().unwrap_or("(untitled)")
}

pub(crate) fn query_suffix(query: &str) -> String {
    if query.trim().is_empty() {
        String::new()
    } else {
        format!(" matching \"{}\"", query.trim())
    }
}
