use anyhow::{bail, Result};
use photoshelf_core::domain::PhotoRecord;
use photoshelf_core::{Session, Shelf};

use super::{display_title, short_id};

pub async fn run(shelf: &Shelf, session: &Session, id: &str) -> Result<()> {
    let snapshot = shelf.store().snapshot();
    let record = resolve(&snapshot, id)?;
    let (full_id, title) = (record.id.clone(), display_title(record).to_string());

    shelf.store().remove(session, &full_id).await?;
    println!("Removed {} \"{}\"", short_id(&full_id), title);
    Ok(())
}

/// Find the one record whose id equals `id` or starts with it.
fn resolve<'a>(records: &'a [PhotoRecord], id: &str) -> Result<&'a PhotoRecord> {
    if let Some(exact) = records.iter().find(|r| r.id == id) {
        return Ok(exact);
    }
    let matches: Vec<&PhotoRecord> = records.iter().filter(|r| r.id.starts_with(id)).collect();
    match matches.as_slice() {
        [] => bail!("no photo with id {id}"),
        [one] => Ok(*one),
        many => bail!("id {id} is ambiguous ({} photos match)", many.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::record;

    fn library() -> Vec<PhotoRecord> {
        vec![
            record("abc123", "2024-10-22T09:00:00Z"),
            record("abc456", "2024-10-21T09:00:00Z"),
            record("def789", "2024-10-20T09:00:00Z"),
        ]
    }

    #[test]
    fn test_resolve_unique_prefix() {
        let records = library();
        assert_eq!(resolve(&records, "def").unwrap().id, "def789");
    }

    #[test]
    fn test_resolve_exact_id() {
        let records = library();
        assert_eq!(resolve(&records, "abc456").unwrap().id, "abc456");
    }

    #[test]
    fn test_resolve_ambiguous_prefix() {
        let records = library();
        let err = resolve(&records, "abc").unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }

    #[test]
    fn test_resolve_unknown() {
        let records = library();
        assert!(resolve(&records, "zzz").is_err());
        assert!(resolve(&[], "abc").is_err());
    }
}
