use comfy_table::{Cell, CellAlignment};
use photoshelf_core::domain::{CaptureInfo, PhotoRecord};
use photoshelf_core::settings::Settings;
use photoshelf_core::timestamp::effective_date;
use photoshelf_core::Shelf;

use super::new_table;

/// Counts shown in the summary line.
#[derive(Debug, PartialEq)]
pub(crate) struct Summary {
    pub(crate) total: usize,
    pub(crate) undated: usize,
    pub(crate) with_location: usize,
    pub(crate) with_camera: usize,
    pub(crate) tagged: usize,
}

impl Summary {
    pub(crate) fn compute(records: &[PhotoRecord]) -> Self {
        let count_info = |pick: fn(&CaptureInfo) -> bool| {
            records
                .iter()
                .filter(|r| r.capture_info.as_ref().is_some_and(pick))
                .count()
        };
        Self {
            total: records.len(),
            undated: records.iter().filter(|r| effective_date(r).is_err()).count(),
            with_location: count_info(|i| i.location.is_some()),
            with_camera: count_info(|i| i.camera.is_some()),
            tagged: records.iter().filter(|r| !r.tags.is_empty()).count(),
        }
    }
}

pub fn run(shelf: &Shelf, settings: &Settings) {
    let snapshot = shelf.store().snapshot();
    let summary = Summary::compute(&snapshot);

    println!();
    println!("  Library: {}", settings.library_dir.display());
    println!("  User:    {}", settings.user);
    println!();
    println!(
        "  {} photos ({} with location, {} with camera, {} tagged)",
        summary.total, summary.with_location, summary.with_camera, summary.tagged
    );
    if summary.undated > 0 {
        println!("  {} photos without a readable date", summary.undated);
    }

    let index = shelf.facets("");
    if !index.time_buckets.is_empty() {
        let mut table = new_table(&["Month", "Photos"]);
        for bucket in &index.time_buckets {
            table.add_row(vec![
                Cell::new(&bucket.year_month),
                Cell::new(bucket.count).set_alignment(CellAlignment::Right),
            ]);
        }
        println!();
        println!("  Recent months");
        println!("  -------------");
        println!("{table}");
    }
    println!();
}
