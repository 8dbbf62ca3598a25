// Location of the per-state results table in a rendered results page.

use std::cmp::Reverse;

use election_records::legacy::{extract_rows, LegacyRowExtractor};
use scraper::{ElementRef, Html, Selector};

use crate::ingest::*;

struct TableSelectors {
    anchors: Selector,
    wikitable: Selector,
    rows: Selector,
    cells: Selector,
}

impl TableSelectors {
    fn new() -> Self {
        Self {
            anchors: Selector::parse("h2, h3, h4, table").expect("anchor selector"),
            wikitable: Selector::parse("table.wikitable").expect("wikitable selector"),
            rows: Selector::parse("tr").expect("row selector"),
            cells: Selector::parse("th, td").expect("cell selector"),
        }
    }
}

fn element_text(element: &ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

// The first table after a heading containing `heading`.
fn table_after_heading<'a>(
    document: &'a Html,
    selectors: &TableSelectors,
    heading: &str,
) -> Option<ElementRef<'a>> {
    let needle = heading.to_lowercase();
    let mut seen = false;
    for element in document.select(&selectors.anchors) {
        if element.value().name() == "table" {
            if seen {
                return Some(element);
            }
        } else if element_text(&element).to_lowercase().contains(&needle) {
            seen = true;
        }
    }
    None
}

// The wikitable with the most rows, the first one on ties.
fn largest_wikitable<'a>(document: &'a Html, selectors: &TableSelectors) -> Option<ElementRef<'a>> {
    document
        .select(&selectors.wikitable)
        .min_by_key(|table| Reverse(table.select(&selectors.rows).count()))
}

// The non-empty rows of a table, `None` if there are none.
fn table_rows(table: ElementRef<'_>, selectors: &TableSelectors) -> Option<Vec<Vec<String>>> {
    let rows: Vec<Vec<String>> = table
        .select(&selectors.rows)
        .map(|row| {
            row.select(&selectors.cells)
                .map(|cell| element_text(&cell))
                .collect::<Vec<String>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect();
    if rows.is_empty() {
        None
    } else {
        Some(rows)
    }
}

/// The cell texts of the results table of a page, row by row.
///
/// The table is the first one following the `heading` heading, or else
/// (no such heading, or an empty table after it) the largest `wikitable` of
/// the page. `None` when no candidate table has rows.
pub fn find_results_table(html: &str, heading: &str) -> Option<Vec<Vec<String>>> {
    let document = Html::parse_document(html);
    let selectors = TableSelectors::new();
    match table_after_heading(&document, &selectors, heading) {
        Some(table) => match table_rows(table, &selectors) {
            Some(rows) => return Some(rows),
            None => debug!(
                "find_results_table: empty table after {:?}, looking for a wikitable",
                heading
            ),
        },
        None => debug!("find_results_table: no heading {:?}, looking for a wikitable", heading),
    }
    table_rows(largest_wikitable(&document, &selectors)?, &selectors)
}

/// The records of one year's results page.
pub fn extract_year(
    year: u32,
    html: &str,
    heading: &str,
    extractor: &dyn LegacyRowExtractor,
) -> IngestResult<NormalizeOutcome> {
    let rows = find_results_table(html, heading).context(TableNotFoundSnafu { year })?;
    debug!("extract_year: {}: {} rows", year, rows.len());
    Ok(extract_rows(extractor, year, &rows))
}
