use comfy_table::{Cell, Color};
use photoshelf_core::domain::PhotoRecord;
use photoshelf_core::Shelf;

use super::{display_date, display_tags, display_title, new_table, query_suffix, short_id};

pub fn run(shelf: &Shelf, query: &str) {
    let view = shelf.view(query);
    let total = shelf.store().len();

    if view.records.is_empty() {
        if total == 0 {
            println!("No photos yet. Add one with `photoshelf upload <FILE>`.");
        } else {
            println!("No photos{}.", query_suffix(query));
        }
        return;
    }

    let mut table = new_table(&["ID", "Date", "Title", "Camera", "Location", "Tags"]);
    for record in &view.records {
        table.add_row(photo_row(record));
    }

    println!("{table}");
    println!();
    println!("  {} of {} photos{}", view.records.len(), total, query_suffix(query));
}

pub(crate) fn photo_row(record: &PhotoRecord) -> Vec<Cell> {
    let info = record.capture_info.as_ref();
    let optional = |value: Option<&String>| match value {
        Some(v) => Cell::new(v),
        None => Cell::new("").fg(Color::DarkGrey),
    };

    vec![
        Cell::new(short_id(&record.id)).fg(Color::Cyan),
        Cell::new(display_date(record)),
        Cell::new(display_title(record)),
        optional(info.and_then(|i| i.camera.as_ref())),
        optional(info.and_then(|i| i.location.as_ref())),
        Cell::new(display_tags(record)),
    ]
}
