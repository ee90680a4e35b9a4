use photoshelf_core::Shelf;

use super::ls::photo_row;
use super::{new_table, query_suffix};

pub fn run(shelf: &Shelf, query: &str) {
    let view = shelf.view(query);

    if view.groups.is_empty() {
        println!("No photos{}.", query_suffix(query));
        return;
    }

    for group in &view.groups {
        let mut table = new_table(&["ID", "Date", "Title", "Camera", "Location", "Tags"]);
        for record in &group.records {
            table.add_row(photo_row(record));
        }
        println!();
        println!("  {} ({})", group.label, plural(group.records.len(), "photo"));
        println!("{table}");
    }

    let grouped: usize = view.groups.iter().map(|g| g.records.len()).sum();
    let undated = view.records.len() - grouped;
    println!();
    println!(
        "  {} in {}{}",
        plural(grouped, "photo"),
        plural(view.groups.len(), "month"),
        query_suffix(query)
    );
    if undated > 0 {
        println!("  {} without a readable date", plural(undated, "photo"));
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
