use anyhow::Result;
use photoshelf_core::query::QueryInput;
use photoshelf_core::Shelf;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Read queries line by line from stdin and list matches once input settles.
///
/// Lines starting with `=` are facet selections (a month, location, camera
/// or tag) and apply without waiting. The listing for the last query is
/// printed when stdin closes.
pub async fn run(shelf: &Shelf) -> Result<()> {
    let (input, mut settled) = shelf.query_channel();
    let mut input = Some(input);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    super::ls::run(shelf, "");

    loop {
        tokio::select! {
            line = lines.next_line(), if input.is_some() => match line? {
                Some(text) => {
                    if let Some(input) = &input {
                        feed(input, &text);
                    }
                }
                // dropping the input publishes whatever is still pending
                None => input = None,
            },
            query = settled.changed() => match query {
                Some(query) => {
                    println!();
                    println!("  query: \"{query}\"");
                    super::ls::run(shelf, &query);
                }
                None => break,
            },
        }
    }
    Ok(())
}

fn feed(input: &QueryInput, line: &str) {
    match parse_line(line) {
        Line::Selection(value) => input.select(value),
        Line::Typed(text) => input.set(text),
    }
}

#[derive(Debug, PartialEq)]
enum Line<'a> {
    Typed(&'a str),
    Selection(&'a str),
}

fn parse_line(line: &str) -> Line<'_> {
    match line.strip_prefix('=') {
        Some(value) => Line::Selection(value.trim()),
        None => Line::Typed(line),
    }
}
