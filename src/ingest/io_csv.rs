// Primitives for reading the tabular source.

use csv::{ReaderBuilder, Trim};

use election_records::tabular::{normalize_tabular, TabularRow, TabularShape};

use crate::ingest::*;

/// The rows of a CSV document, and the number of lines that could not be read.
pub fn read_tabular_rows(text: &str) -> IngestResult<(Vec<String>, Vec<TabularRow>, usize)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .context(CsvParseSnafu {})?
        .iter()
        .map(|h| h.to_string())
        .collect();
    debug!("read_tabular_rows: headers: {:?}", headers);

    let (rows, unreadable) = reader.records().enumerate().fold(
        (Vec::new(), 0usize),
        |(mut rows, unreadable), (idx, line)| match line {
            Ok(record) => {
                rows.push(TabularRow::from_pairs(headers.iter().zip(record.iter())));
                (rows, unreadable)
            }
            Err(e) => {
                debug!("read_tabular_rows: line {}: {}", idx + 2, e);
                (rows, unreadable + 1)
            }
        },
    );
    Ok((headers, rows, unreadable))
}

/// Normalizes a tabular document. The shape is detected from the header
/// unless given.
pub fn normalize_tabular_text(
    text: &str,
    shape: Option<TabularShape>,
) -> IngestResult<NormalizeOutcome> {
    let (headers, rows, unreadable) = read_tabular_rows(text)?;
    let shape = shape.unwrap_or_else(|| TabularShape::detect(&headers[..]));
    info!(
        "normalize_tabular_text: {} rows, shape {:?}",
        rows.len(),
        shape
    );
    let mut outcome = normalize_tabular(shape, &rows);
    outcome.malformed += unreadable;
    Ok(outcome)
}
