use comfy_table::{Cell, CellAlignment};
use photoshelf_core::Shelf;

use super::{new_table, query_suffix};

pub fn locations(shelf: &Shelf, query: &str) {
    let index = shelf.facets(query);
    print_ranking(
        "Location",
        index.locations.iter().map(|e| (e.label.as_str(), e.count)),
        query,
    );
}

pub fn cameras(shelf: &Shelf, query: &str) {
    let index = shelf.facets(query);
    print_ranking(
        "Camera",
        index.cameras.iter().map(|e| (e.camera.as_str(), e.count)),
        query,
    );
}

pub fn tags(shelf: &Shelf, query: &str) {
    let index = shelf.facets(query);
    print_ranking(
        "Tag",
        index.tags.iter().map(|e| (e.name.as_str(), e.count)),
        query,
    );
}

pub fn suggest(shelf: &Shelf, partial: &str) {
    let suggestions = shelf.tag_suggestions(partial);
    if suggestions.is_empty() {
        println!("No tags contain \"{}\".", partial.trim());
        return;
    }
    print_ranking(
        "Tag",
        suggestions.iter().map(|e| (e.name.as_str(), e.count)),
        "",
    );
}

fn print_ranking<'a>(label: &str, entries: impl Iterator<Item = (&'a str, usize)>, query: &str) {
    let rows: Vec<(&str, usize)> = entries.collect();
    if rows.is_empty() {
        println!("No {}s found{}.", label.to_lowercase(), query_suffix(query));
        return;
    }

    let mut table = new_table(&[label, "Photos"]);
    for (value, count) in &rows {
        table.add_row(vec![
            Cell::new(value),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");
}
