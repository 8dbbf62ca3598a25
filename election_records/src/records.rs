// ********* Canonical records ***********

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::Display;

/// First election year covered by the dataset.
pub const FIRST_YEAR: u32 = 1948;
/// Last election year covered by the dataset.
pub const LAST_YEAR: u32 = 2020;
/// The tabular (MEDSL-style) source starts with this election.
pub const FIRST_TABULAR_YEAR: u32 = 1976;
/// The last election only available from scraped results pages.
pub const LAST_SCRAPED_YEAR: u32 = 1972;

/// Tolerance when checking that the two major-party shares do not exceed 1.
pub(crate) const SHARE_EPSILON: f64 = 1e-9;

/// The party that carried a state.
///
/// `Oth` is also used whenever one of the major-party shares is unknown.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Party {
    Dem,
    Rep,
    Oth,
}

/// A two-digit, zero-padded state FIPS code ("06" for California).
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StateFips(pub(crate) String);

impl StateFips {
    /// Parses a numeric FIPS code, padding it to two digits.
    ///
    /// Accepts "6", "06" and " 06 ". Rejects non-digits, zero and anything
    /// above 99.
    pub fn parse(raw: &str) -> Option<StateFips> {
        let s = raw.trim();
        if s.is_empty() || s.len() > 2 || !s.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let code: u32 = s.parse().ok()?;
        if code == 0 {
            return None;
        }
        Some(StateFips(format!("{:02}", code)))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for StateFips {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for StateFips {
    type Error = RowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        StateFips::parse(&value).ok_or(RowError::InvalidFips(value))
    }
}

impl From<StateFips> for String {
    fn from(value: StateFips) -> String {
        value.0
    }
}

/// The canonical unit of the dataset: the result of one state in one election.
///
/// Records are only built through [`crate::builder::RecordBuilder`], which
/// derives the other share and the winner once. There is no way to mutate a
/// record afterwards.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionRecord {
    pub(crate) year: u32,
    pub(crate) state_fips: StateFips,
    pub(crate) state_name: String,
    pub(crate) state_abbr: String,
    pub(crate) electoral_votes: Option<u32>,
    pub(crate) dem_share: Option<f64>,
    pub(crate) rep_share: Option<f64>,
    pub(crate) other_share: Option<f64>,
    pub(crate) winner_party: Party,
    #[serde(default)]
    pub(crate) winner_name: String,
    #[serde(default)]
    pub(crate) runner_up_name: String,
    #[serde(default)]
    pub(crate) dem_candidate_name: String,
    #[serde(default)]
    pub(crate) rep_candidate_name: String,
}

impl ElectionRecord {
    pub fn year(&self) -> u32 {
        self.year
    }
    pub fn state_fips(&self) -> &StateFips {
        &self.state_fips
    }
    pub fn state_name(&self) -> &str {
        &self.state_name
    }
    pub fn state_abbr(&self) -> &str {
        &self.state_abbr
    }
    pub fn electoral_votes(&self) -> Option<u32> {
        self.electoral_votes
    }
    pub fn dem_share(&self) -> Option<f64> {
        self.dem_share
    }
    pub fn rep_share(&self) -> Option<f64> {
        self.rep_share
    }
    pub fn other_share(&self) -> Option<f64> {
        self.other_share
    }
    pub fn winner_party(&self) -> Party {
        self.winner_party
    }
    pub fn winner_name(&self) -> &str {
        &self.winner_name
    }
    pub fn runner_up_name(&self) -> &str {
        &self.runner_up_name
    }
    pub fn dem_candidate_name(&self) -> &str {
        &self.dem_candidate_name
    }
    pub fn rep_candidate_name(&self) -> &str {
        &self.rep_candidate_name
    }

    /// The merge key of this record.
    pub fn key(&self) -> (u32, StateFips) {
        (self.year, self.state_fips.clone())
    }
}

/// The result of normalizing a batch of raw rows.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct NormalizeOutcome {
    pub records: Vec<ElectionRecord>,
    /// Rows outside of the scope of the dataset (other offices, other years).
    pub dropped: usize,
    /// Rows that could not be understood.
    pub malformed: usize,
}

impl NormalizeOutcome {
    /// Adds the records and the counters of another batch to this one.
    pub fn absorb(mut self, other: NormalizeOutcome) -> NormalizeOutcome {
        self.records.extend(other.records);
        self.dropped += other.dropped;
        self.malformed += other.malformed;
        self
    }
}

// ********* Configuration **********

/// What the merge step does when two records share the same (year, state).
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum CollisionPolicy {
    /// Any collision stops the merge.
    #[default]
    Fail,
    /// A tabular record replaces a scraped record for the same key.
    PreferTabular,
    /// A scraped record is kept over a tabular record for the same key.
    PreferScraped,
}

/// The origin of a batch of records.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Origin {
    Scraped,
    Tabular,
}

// ********* Errors **********

/// Reasons why a single raw row does not produce a record.
#[derive(PartialEq, Debug, Clone)]
pub enum RowError {
    MissingField(&'static str),
    InvalidNumber { field: &'static str, value: String },
    ShareOutOfRange { field: &'static str, value: f64 },
    SharesExceedOne { dem: f64, rep: f64 },
    UnknownState(String),
    InvalidFips(String),
    FipsMismatch { abbr: String, fips: String },
    YearOutOfRange(u32),
    NoStateToken,
    TooFewPercentages(usize),
    EmptyTotal,
}

impl Error for RowError {}

impl Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowError::MissingField(name) => write!(f, "missing field {}", name),
            RowError::InvalidNumber { field, value } => {
                write!(f, "field {}: not a number: {:?}", field, value)
            }
            RowError::ShareOutOfRange { field, value } => {
                write!(f, "field {}: share {} outside of [0, 1]", field, value)
            }
            RowError::SharesExceedOne { dem, rep } => {
                write!(f, "major party shares {} + {} exceed 1", dem, rep)
            }
            RowError::UnknownState(s) => write!(f, "unknown state {:?}", s),
            RowError::InvalidFips(s) => write!(f, "invalid FIPS code {:?}", s),
            RowError::FipsMismatch { abbr, fips } => {
                write!(f, "state {} does not have FIPS code {}", abbr, fips)
            }
            RowError::YearOutOfRange(y) => write!(f, "no presidential election in {}", y),
            RowError::NoStateToken => write!(f, "no state abbreviation in row"),
            RowError::TooFewPercentages(n) => {
                write!(f, "expected at least two percentages, found {}", n)
            }
            RowError::EmptyTotal => write!(f, "no votes recorded"),
        }
    }
}

/// Errors from the merge step.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum MergeError {
    Collision {
        year: u32,
        fips: StateFips,
        existing: Origin,
        incoming: Origin,
    },
}

impl Error for MergeError {}

impl Display for MergeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeError::Collision {
                year,
                fips,
                existing,
                incoming,
            } => write!(
                f,
                "two records for year {} and state {} ({:?} and {:?} sources)",
                year, fips, existing, incoming
            ),
        }
    }
}
