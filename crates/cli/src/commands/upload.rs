use std::path::Path;

use anyhow::{Context, Result};
use photoshelf_core::exif::capture_hints;
use photoshelf_core::{PhotoUpload, Session, Shelf};
use tracing::debug;

use super::{display_date, display_title, short_id};

pub async fn run(shelf: &Shelf, session: &Session, file: &Path, caption: Option<String>) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("not a file path: {}", file.display()))?;

    let hints = capture_hints(&bytes);
    debug!(file = %file_name, found = hints.is_some(), "extracted capture hints");

    let upload = PhotoUpload {
        bytes,
        file_name,
        caption,
        hints,
    };
    let record = shelf.store().create(session, upload).await?;

    println!(
        "Added {} \"{}\" ({})",
        short_id(&record.id),
        display_title(&record),
        display_date(&record)
    );
    Ok(())
}
