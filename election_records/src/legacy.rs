//! Records from the rows of old, scraped results tables (1948-1972).
//!
//! These tables have no reliable headers, so the values are found by
//! position and shape rather than by column name. The logic sits behind
//! [`LegacyRowExtractor`] so that it can be replaced by a verified static
//! dataset without touching the rest of the pipeline.

use log::debug;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::builder::RecordBuilder;
use crate::nominees;
use crate::records::*;
use crate::states::{self, StateInfo};

/// Turns the cell texts of one table row into a record.
pub trait LegacyRowExtractor {
    fn extract(&self, year: u32, cells: &[String]) -> Result<ElectionRecord, RowError>;
}

/// Positional heuristic over the cells of a row.
///
/// - the state is the first two-letter token that is a state abbreviation;
/// - a last percentage equal to the difference of two earlier ones is the
///   margin column and is ignored;
/// - the two largest percentages are the two major parties, in column
///   order, the first column belonging to the party of that year's national
///   winner (which is how the tables are laid out);
/// - the electoral votes are the last integer cell not above `ev_ceiling`.
///
/// A strong third party (1948, 1968) takes one of the two slots and the
/// shares end up assigned to the wrong parties. This is a known limitation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct HeuristicExtractor {
    pub ev_ceiling: u32,
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        // No state had more than 55 electors in that era.
        HeuristicExtractor { ev_ceiling: 100 }
    }
}

// Margins are printed with two decimals, like the percentages they derive from.
const MARGIN_TOLERANCE: f64 = 0.01 + 1e-9;

#[derive(PartialEq, Debug, Clone, Copy)]
enum Cell {
    Percent(f64),
    Integer(u64),
    Text,
}

fn regex(slot: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    slot.get_or_init(|| Regex::new(pattern).expect("valid pattern"))
}

fn footnote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\[[^\]]*\]")
}

fn state_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\b([A-Z]{2})\b")
}

fn percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"^(\d{1,3}(?:\.\d+)?)\s*%$|^(\d{1,3}\.\d+)$")
}

fn integer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"^(\d{1,3}(?:,\d{3})+|\d+)$")
}

/// Removes footnote markers and non-breaking spaces.
fn clean_cell(raw: &str) -> String {
    let s = raw.replace('\u{a0}', " ");
    footnote_re().replace_all(&s, "").trim().to_string()
}

fn classify(cell: &str) -> Cell {
    if let Some(c) = percent_re().captures(cell) {
        let value = c
            .get(1)
            .or_else(|| c.get(2))
            .and_then(|m| m.as_str().parse::<f64>().ok());
        if let Some(v) = value {
            if v <= 100.0 {
                return Cell::Percent(v);
            }
        }
        return Cell::Text;
    }
    if integer_re().is_match(cell) {
        if let Ok(v) = cell.replace(',', "").parse::<u64>() {
            return Cell::Integer(v);
        }
    }
    Cell::Text
}

fn state_token(cell: &str) -> Option<&'static StateInfo> {
    state_token_re()
        .captures_iter(cell)
        .filter_map(|c| c.get(1))
        .find_map(|m| states::by_abbr(m.as_str()))
}

// Tables with a "Margin" column end with the difference of two of the
// candidates' percentages.
fn is_margin(percentages: &[(usize, f64)]) -> bool {
    match percentages.split_last() {
        Some((&(_, last), earlier)) if earlier.len() >= 2 => earlier.iter().any(|(i, a)| {
            earlier
                .iter()
                .filter(|(j, _)| j != i)
                .any(|(_, b)| ((a - b).abs() - last.abs()).abs() <= MARGIN_TOLERANCE)
        }),
        _ => false,
    }
}

impl LegacyRowExtractor for HeuristicExtractor {
    fn extract(&self, year: u32, cells: &[String]) -> Result<ElectionRecord, RowError> {
        let directory = nominees::for_year(year).ok_or(RowError::YearOutOfRange(year))?;
        let cleaned: Vec<String> = cells.iter().map(|c| clean_cell(c)).collect();
        let state = cleaned
            .iter()
            .find_map(|c| state_token(c))
            .ok_or(RowError::NoStateToken)?;

        let classified: Vec<Cell> = cleaned.iter().map(|c| classify(c)).collect();
        let mut percentages: Vec<(usize, f64)> = classified
            .iter()
            .enumerate()
            .filter_map(|(idx, c)| match c {
                Cell::Percent(v) => Some((idx, *v)),
                _ => None,
            })
            .collect();
        if is_margin(&percentages) {
            percentages.pop();
        }
        if percentages.len() < 2 {
            return Err(RowError::TooFewPercentages(percentages.len()));
        }
        // Largest first; the sort is stable so equal values keep column order.
        percentages.sort_by(|a, b| b.1.total_cmp(&a.1));
        let mut top = [percentages[0], percentages[1]];
        top.sort_by_key(|p| p.0);
        let (first, second) = (top[0].1 / 100.0, top[1].1 / 100.0);
        let (dem, rep) = match directory.winner {
            Party::Rep => (second, first),
            _ => (first, second),
        };

        let ev = classified
            .iter()
            .rev()
            .find_map(|c| match c {
                Cell::Integer(v) if *v <= self.ev_ceiling as u64 => Some(*v as u32),
                _ => None,
            });

        RecordBuilder::new(year, state)
            .shares(Some(dem), Some(rep))
            .electoral_votes(ev)
            .build()
    }
}

/// Runs an extractor over all the rows of one year's table.
///
/// Rows without a state are not results (headers, totals) and are dropped.
/// A state seen twice keeps its first row.
pub fn extract_rows<E>(extractor: &E, year: u32, rows: &[Vec<String>]) -> NormalizeOutcome
where
    E: LegacyRowExtractor + ?Sized,
{
    let (outcome, _) = rows.iter().enumerate().fold(
        (NormalizeOutcome::default(), HashSet::new()),
        |(mut acc, mut seen), (idx, cells)| {
            match extractor.extract(year, cells) {
                Ok(r) if seen.contains(r.state_fips()) => {
                    debug!(
                        "extract_rows: {}: row {}: duplicate state {}",
                        year,
                        idx,
                        r.state_abbr()
                    );
                    acc.malformed += 1;
                }
                Ok(r) => {
                    seen.insert(r.state_fips().clone());
                    acc.records.push(r);
                }
                Err(RowError::NoStateToken) => acc.dropped += 1,
                Err(e) => {
                    debug!("extract_rows: {}: row {}: skipping: {}", year, idx, e);
                    acc.malformed += 1;
                }
            }
            (acc, seen)
        },
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn winner_party_is_listed_first() {
        let ex = HeuristicExtractor::default();
        let texas = cells(&[
            "Texas", "24", "1,167,567", "50.52%", "24", "1,121,310", "48.52%", "", "22,207",
            "0.96%", "2,311,084", "TX",
        ]);
        let r = ex.extract(1960, &texas).unwrap();
        assert_eq!(r.state_fips().as_str(), "48");
        assert!((r.dem_share().unwrap() - 0.5052).abs() < 1e-12);
        assert!((r.rep_share().unwrap() - 0.4852).abs() < 1e-12);
        assert_eq!(r.electoral_votes(), Some(24));
        assert_eq!(r.winner_name(), "John F. Kennedy");

        let california = cells(&[
            "California", "45", "4,602,096", "55.00%", "45", "3,475,847", "41.54%", "–", "CA",
        ]);
        let r = ex.extract(1972, &california).unwrap();
        assert!((r.rep_share().unwrap() - 0.55).abs() < 1e-12);
        assert!((r.dem_share().unwrap() - 0.4154).abs() < 1e-12);
        assert_eq!(r.winner_party(), Party::Rep);
        assert_eq!(r.electoral_votes(), Some(45));
    }

    #[test]
    fn footnotes_and_bare_decimals() {
        let ex = HeuristicExtractor::default();
        let ohio = cells(&[
            "Ohio[b]", "25", "1,944,248", "53.28", "1,725,560", "44.95\u{a0}", "OH",
        ]);
        let r = ex.extract(1948, &ohio).unwrap();
        assert_eq!(r.state_abbr(), "OH");
        assert!((r.dem_share().unwrap() - 0.5328).abs() < 1e-12);
        // 1948: the integers above the ceiling are vote counts.
        assert_eq!(r.electoral_votes(), Some(25));
    }

    #[test]
    fn row_without_state_token_is_dropped() {
        let ex = HeuristicExtractor::default();
        let rows = vec![
            cells(&["State", "Electoral votes", "Votes", "%", "Total"]),
            cells(&["Maine", "5", "232,353", "57.10%", "5", "174,603", "42.90%", "ME"]),
            cells(&["Totals:", "531", "35,590,472", "57.37%", "442", "26,022,752", "41.95%"]),
        ];
        let out = extract_rows(&ex, 1956, &rows);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.dropped, 2);
        assert_eq!(out.malformed, 0);
        assert_eq!(out.records[0].winner_party(), Party::Rep);
    }

    #[test]
    fn rows_without_two_percentages_are_malformed() {
        let ex = HeuristicExtractor::default();
        let rows = vec![
            cells(&["Alaska", "3", "–", "AK"]),
            cells(&["Hawaii", "3", "163,249", "50.03%", "163,134", "49.97%", "HI"]),
            cells(&["Hawaii (recount)", "3", "50.03%", "49.97%", "HI"]),
        ];
        let out = extract_rows(&ex, 1960, &rows);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.malformed, 2);
    }

    #[test]
    fn third_party_rows_are_misassigned() {
        // 1968 Alabama: Nixon 13.99%, Humphrey 18.72%, Wallace 65.86%.
        let ex = HeuristicExtractor::default();
        let alabama = cells(&[
            "Alabama", "10", "146,923", "13.99%", "196,579", "18.72%", "691,425", "65.86%",
            "10", "AL",
        ]);
        let r = ex.extract(1968, &alabama).unwrap();
        assert!((r.rep_share().unwrap() - 0.1872).abs() < 1e-12);
        assert!((r.dem_share().unwrap() - 0.6586).abs() < 1e-12);
    }

    #[test]
    fn margin_column_is_not_a_share() {
        // 1964 Rhode Island: Johnson 80.87%, Goldwater 19.13%, margin 61.74%.
        let ex = HeuristicExtractor::default();
        let rhode_island = cells(&[
            "Rhode Island", "4", "315,463", "80.87%", "4", "74,615", "19.13%", "240,848",
            "61.74%", "390,091", "RI",
        ]);
        let r = ex.extract(1964, &rhode_island).unwrap();
        assert!((r.dem_share().unwrap() - 0.8087).abs() < 1e-12);
        assert!((r.rep_share().unwrap() - 0.1913).abs() < 1e-12);
        assert_eq!(r.winner_party(), Party::Dem);
        assert_eq!(r.electoral_votes(), Some(4));

        // A close state: the margin is the smallest percentage.
        let texas = cells(&[
            "Texas", "24", "1,167,567", "50.52%", "24", "1,121,310", "48.52%", "22,207",
            "0.96%", "46,257", "2.00%", "2,311,084", "TX",
        ]);
        let r = ex.extract(1960, &texas).unwrap();
        assert!((r.dem_share().unwrap() - 0.5052).abs() < 1e-12);
        assert!((r.rep_share().unwrap() - 0.4852).abs() < 1e-12);
    }

    #[test]
    fn ev_ceiling_is_configurable() {
        let ex = HeuristicExtractor { ev_ceiling: 20 };
        let ny = cells(&["New York", "45", "3,952,815", "52.53%", "3,446,419", "45.80%", "NY"]);
        let r = ex.extract(1960, &ny).unwrap();
        assert_eq!(r.electoral_votes(), None);
    }

    #[test]
    fn years_without_election_are_rejected() {
        let ex = HeuristicExtractor::default();
        let res = ex.extract(1950, &cells(&["Ohio", "50%", "50%", "OH"]));
        assert_eq!(res, Err(RowError::YearOutOfRange(1950)));
    }
}
