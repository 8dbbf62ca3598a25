//! Normalization of tabular (MEDSL-style) rows into records.
//!
//! Two shapes are understood:
//! - `Wide`: one row per state and year, with vote shares already computed.
//! - `Long`: one row per candidate, state and year, with raw vote counts.
//!   Rows are folded into one tally per state before computing the shares.
//!
//! Column names changed across the revisions of the source files. Each
//! concept is resolved through an ordered list of candidate names, the first
//! present and non-empty column wins.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::builder::RecordBuilder;
use crate::records::*;
use crate::states::{self, StateInfo};

pub const YEAR_FIELDS: &[&str] = &["year"];
pub const OFFICE_FIELDS: &[&str] = &["office"];
pub const ABBR_FIELDS: &[&str] = &["state_po", "state_abbr", "abbr"];
pub const FIPS_FIELDS: &[&str] = &["state_fips", "fips", "statefp"];
pub const NAME_FIELDS: &[&str] = &["state", "state_name"];
pub const DEM_SHARE_FIELDS: &[&str] = &["democratic_percentage", "dem_pct", "dem_share"];
pub const REP_SHARE_FIELDS: &[&str] = &["republican_percentage", "rep_pct", "rep_share"];
pub const EV_FIELDS: &[&str] = &["total_electoral_votes", "electoral_votes", "ev"];
pub const DEM_NAME_FIELDS: &[&str] = &["democratic_candidate", "dem_candidate"];
pub const REP_NAME_FIELDS: &[&str] = &["republican_candidate", "rep_candidate"];
pub const PARTY_FIELDS: &[&str] = &["party_simplified", "party_detailed", "party"];
pub const CANDIDATE_FIELDS: &[&str] = &["candidate"];
pub const CANDIDATE_VOTES_FIELDS: &[&str] = &["candidatevotes"];
pub const TOTAL_VOTES_FIELDS: &[&str] = &["totalvotes"];

/// The layout of a tabular source.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TabularShape {
    Wide,
    Long,
}

impl TabularShape {
    /// Per-candidate vote counts mean the long shape.
    pub fn detect<S: AsRef<str>>(headers: &[S]) -> TabularShape {
        let long = headers.iter().any(|h| {
            let h = normalize_header(h.as_ref());
            CANDIDATE_VOTES_FIELDS.contains(&h.as_str())
        });
        if long {
            TabularShape::Long
        } else {
            TabularShape::Wide
        }
    }
}

/// One raw row, keyed by normalized (trimmed, lowercase) header names.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct TabularRow {
    fields: HashMap<String, String>,
}

impl TabularRow {
    pub fn from_pairs<I, K, V>(pairs: I) -> TabularRow
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        TabularRow {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (normalize_header(k.as_ref()), v.as_ref().trim().to_string()))
                .collect(),
        }
    }

    /// The value of the first candidate column that is present and not empty.
    pub fn first_of(&self, candidates: &[&str]) -> Option<&str> {
        candidates
            .iter()
            .filter_map(|c| self.fields.get(*c))
            .map(|v| v.as_str())
            .find(|v| !v.is_empty())
    }
}

fn normalize_header(h: &str) -> String {
    h.trim_start_matches('\u{feff}').trim().to_ascii_lowercase()
}

/// Converts a share written as a percentage (0-100) into a fraction.
///
/// Only values above 1 are divided: "0.5345" is already a fraction.
pub fn scale_share(v: f64) -> f64 {
    if v > 1.0 {
        v / 100.0
    } else {
        v
    }
}

pub fn is_presidential(office: &str) -> bool {
    matches!(
        office.trim().to_ascii_uppercase().as_str(),
        "PRESIDENT" | "US PRESIDENT" | "U.S. PRESIDENT"
    )
}

fn parse_u32(field: &'static str, raw: &str) -> Result<u32, RowError> {
    raw.trim()
        .replace(',', "")
        .parse::<u32>()
        .map_err(|_| RowError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

fn parse_u64(field: &'static str, raw: &str) -> Result<u64, RowError> {
    raw.trim()
        .replace(',', "")
        .parse::<u64>()
        .map_err(|_| RowError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

fn parse_share(field: &'static str, raw: &str) -> Result<f64, RowError> {
    let s = raw.trim().trim_end_matches('%').trim();
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(scale_share(v)),
        _ => Err(RowError::InvalidNumber {
            field,
            value: raw.to_string(),
        }),
    }
}

fn optional_share(row: &TabularRow, field: &'static str, fields: &[&str]) -> Result<Option<f64>, RowError> {
    row.first_of(fields).map(|s| parse_share(field, s)).transpose()
}

/// The election year of a presidential row in the range of the tabular source.
/// `None` means the row is out of scope.
fn presidential_year(row: &TabularRow) -> Result<Option<u32>, RowError> {
    let office = row
        .first_of(OFFICE_FIELDS)
        .ok_or(RowError::MissingField("office"))?;
    if !is_presidential(office) {
        return Ok(None);
    }
    let year = parse_u32(
        "year",
        row.first_of(YEAR_FIELDS)
            .ok_or(RowError::MissingField("year"))?,
    )?;
    if year < FIRST_TABULAR_YEAR {
        return Ok(None);
    }
    Ok(Some(year))
}

/// Resolves the state of a row from its abbreviation, FIPS code or name, in
/// this order. A FIPS code that contradicts the abbreviation is an error.
pub fn resolve_state(row: &TabularRow) -> Result<&'static StateInfo, RowError> {
    let fips = match row.first_of(FIPS_FIELDS) {
        Some(raw) => Some(StateFips::parse(raw).ok_or_else(|| RowError::InvalidFips(raw.to_string()))?),
        None => None,
    };
    if let Some(abbr) = row.first_of(ABBR_FIELDS) {
        let state = states::by_abbr(abbr).ok_or_else(|| RowError::UnknownState(abbr.to_string()))?;
        if let Some(f) = fips {
            if f.as_str() != state.fips {
                return Err(RowError::FipsMismatch {
                    abbr: state.abbr.to_string(),
                    fips: f.to_string(),
                });
            }
        }
        return Ok(state);
    }
    if let Some(f) = fips {
        return states::by_fips(&f).ok_or_else(|| RowError::UnknownState(f.to_string()));
    }
    let name = row
        .first_of(NAME_FIELDS)
        .ok_or(RowError::MissingField("state_po"))?;
    states::by_name(name).ok_or_else(|| RowError::UnknownState(name.to_string()))
}

/// Normalizes one wide row. `Ok(None)` when the row is not a presidential
/// result covered by the tabular source.
pub fn normalize_wide_row(row: &TabularRow) -> Result<Option<ElectionRecord>, RowError> {
    let year = match presidential_year(row)? {
        Some(y) => y,
        None => return Ok(None),
    };
    let state = resolve_state(row)?;
    let dem = optional_share(row, "democratic_percentage", DEM_SHARE_FIELDS)?;
    let rep = optional_share(row, "republican_percentage", REP_SHARE_FIELDS)?;
    let ev = row
        .first_of(EV_FIELDS)
        .map(|s| parse_u32("total_electoral_votes", s))
        .transpose()?;
    let record = RecordBuilder::new(year, state)
        .shares(dem, rep)
        .electoral_votes(ev)
        .candidates(
            row.first_of(DEM_NAME_FIELDS).map(String::from),
            row.first_of(REP_NAME_FIELDS).map(String::from),
        )
        .build()?;
    Ok(Some(record))
}

pub fn normalize_wide<'a, I>(rows: I) -> NormalizeOutcome
where
    I: IntoIterator<Item = &'a TabularRow>,
{
    rows.into_iter()
        .enumerate()
        .fold(NormalizeOutcome::default(), |mut acc, (idx, row)| {
            match normalize_wide_row(row) {
                Ok(Some(r)) => acc.records.push(r),
                Ok(None) => acc.dropped += 1,
                Err(e) => {
                    // +2: one for the header line, one for 1-based numbering.
                    debug!("normalize_wide: line {}: skipping row: {}", idx + 2, e);
                    acc.malformed += 1;
                }
            }
            acc
        })
}

fn party_of(raw: &str) -> Party {
    let p = raw.to_ascii_uppercase();
    if p.contains("DEMOCRAT") {
        Party::Dem
    } else if p.contains("REPUBLICAN") {
        Party::Rep
    } else {
        Party::Oth
    }
}

struct CandidateLine {
    year: u32,
    state: &'static StateInfo,
    party: Party,
    candidate: Option<String>,
    votes: u64,
    total: Option<u64>,
}

fn read_candidate_line(row: &TabularRow) -> Result<Option<CandidateLine>, RowError> {
    let year = match presidential_year(row)? {
        Some(y) => y,
        None => return Ok(None),
    };
    let state = resolve_state(row)?;
    let party = party_of(row.first_of(PARTY_FIELDS).unwrap_or_default());
    let candidate = row
        .first_of(CANDIDATE_FIELDS)
        .map(|c| c.trim().to_ascii_uppercase());
    let votes = parse_u64(
        "candidatevotes",
        row.first_of(CANDIDATE_VOTES_FIELDS)
            .ok_or(RowError::MissingField("candidatevotes"))?,
    )?;
    let total = row
        .first_of(TOTAL_VOTES_FIELDS)
        .map(|s| parse_u64("totalvotes", s))
        .transpose()?;
    Ok(Some(CandidateLine {
        year,
        state,
        party,
        candidate,
        votes,
        total,
    }))
}

#[derive(Default)]
struct StateTally {
    // (party, candidate, votes) of every line of the state.
    lines: Vec<(Party, Option<String>, u64)>,
    reported_total: u64,
}

impl StateTally {
    fn add(mut self, line: CandidateLine) -> StateTally {
        self.reported_total = self.reported_total.max(line.total.unwrap_or(0));
        self.lines.push((line.party, line.candidate, line.votes));
        self
    }

    /// The votes of a major party, including the lines its nominee got on
    /// minor tickets (fusion voting, as in New York).
    fn major_votes(&self, party: Party) -> u64 {
        let nominees: HashSet<&str> = self
            .lines
            .iter()
            .filter(|(p, _, _)| *p == party)
            .filter_map(|(_, c, _)| c.as_deref())
            .collect();
        self.lines
            .iter()
            .filter(|(p, c, _)| {
                *p == party
                    || (*p == Party::Oth && c.as_deref().map_or(false, |c| nominees.contains(c)))
            })
            .map(|(_, _, v)| *v)
            .sum()
    }

    fn total(&self) -> u64 {
        if self.reported_total > 0 {
            self.reported_total
        } else {
            self.lines.iter().map(|(_, _, v)| *v).sum()
        }
    }
}

/// Aggregates per-candidate rows into one record per state and year.
///
/// The source carries no electoral votes, they stay unknown. Candidate names
/// come from the nominee directory.
pub fn normalize_long<'a, I>(rows: I) -> NormalizeOutcome
where
    I: IntoIterator<Item = &'a TabularRow>,
{
    type Tallies = BTreeMap<(u32, &'static str), (&'static StateInfo, StateTally)>;
    let (tallies, dropped, malformed) = rows.into_iter().enumerate().fold(
        (Tallies::new(), 0, 0),
        |(mut tallies, dropped, malformed), (idx, row)| match read_candidate_line(row) {
            Ok(Some(line)) => {
                let key = (line.year, line.state.fips);
                let (state, tally) = tallies
                    .remove(&key)
                    .unwrap_or_else(|| (line.state, StateTally::default()));
                tallies.insert(key, (state, tally.add(line)));
                (tallies, dropped, malformed)
            }
            Ok(None) => (tallies, dropped + 1, malformed),
            Err(e) => {
                debug!("normalize_long: line {}: skipping row: {}", idx + 2, e);
                (tallies, dropped, malformed + 1)
            }
        },
    );

    tallies.into_iter().fold(
        NormalizeOutcome {
            records: Vec::new(),
            dropped,
            malformed,
        },
        |mut acc, ((year, _), (state, tally))| {
            let total = tally.total();
            let built = if total == 0 {
                Err(RowError::EmptyTotal)
            } else {
                RecordBuilder::new(year, state)
                    .shares(
                        Some(tally.major_votes(Party::Dem) as f64 / total as f64),
                        Some(tally.major_votes(Party::Rep) as f64 / total as f64),
                    )
                    .build()
            };
            match built {
                Ok(r) => acc.records.push(r),
                Err(e) => {
                    debug!("normalize_long: {} {}: skipping state: {}", year, state.abbr, e);
                    acc.malformed += 1;
                }
            }
            acc
        },
    )
}

pub fn normalize_tabular<'a, I>(shape: TabularShape, rows: I) -> NormalizeOutcome
where
    I: IntoIterator<Item = &'a TabularRow>,
{
    match shape {
        TabularShape::Wide => normalize_wide(rows),
        TabularShape::Long => normalize_long(rows),
    }
}
