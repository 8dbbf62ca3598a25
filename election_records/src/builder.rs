use crate::nominees;
pub use crate::records::*;
use crate::records::SHARE_EPSILON;
use crate::states::StateInfo;

/// A builder for election records.
///
/// All the derived values of a record (the other share, the winner and the
/// candidate names) are computed here, once.
///
/// ```
/// use election_records::builder::RecordBuilder;
/// use election_records::{states, Party, RowError};
///
/// let ca = states::by_abbr("CA").unwrap();
/// let record = RecordBuilder::new(2000, ca)
///     .shares(Some(0.5345), Some(0.4165))
///     .electoral_votes(Some(54))
///     .build()?;
///
/// assert_eq!(record.state_fips().as_str(), "06");
/// assert_eq!(record.winner_party(), Party::Dem);
/// assert_eq!(record.winner_name(), "Al Gore");
///
/// # Ok::<(), RowError>(())
/// ```
pub struct RecordBuilder {
    pub(crate) _year: u32,
    pub(crate) _state: &'static StateInfo,
    pub(crate) _electoral_votes: Option<u32>,
    pub(crate) _dem_share: Option<f64>,
    pub(crate) _rep_share: Option<f64>,
    pub(crate) _dem_name: Option<String>,
    pub(crate) _rep_name: Option<String>,
}

impl RecordBuilder {
    pub fn new(year: u32, state: &'static StateInfo) -> RecordBuilder {
        RecordBuilder {
            _year: year,
            _state: state,
            _electoral_votes: None,
            _dem_share: None,
            _rep_share: None,
            _dem_name: None,
            _rep_name: None,
        }
    }

    pub fn electoral_votes(self, ev: Option<u32>) -> RecordBuilder {
        RecordBuilder {
            _electoral_votes: ev,
            ..self
        }
    }

    /// Sets the major-party shares, as fractions of the total vote.
    pub fn shares(self, dem: Option<f64>, rep: Option<f64>) -> RecordBuilder {
        RecordBuilder {
            _dem_share: dem,
            _rep_share: rep,
            ..self
        }
    }

    /// Sets the candidate names. Empty or missing names are filled from the
    /// nominee directory.
    pub fn candidates(self, dem: Option<String>, rep: Option<String>) -> RecordBuilder {
        RecordBuilder {
            _dem_name: dem,
            _rep_name: rep,
            ..self
        }
    }

    pub fn build(self) -> Result<ElectionRecord, RowError> {
        let year = self._year;
        if !(FIRST_YEAR..=LAST_YEAR).contains(&year) || year % 4 != 0 {
            return Err(RowError::YearOutOfRange(year));
        }
        let dem = check_share("demShare", self._dem_share)?;
        let rep = check_share("repShare", self._rep_share)?;
        let other = match (dem, rep) {
            (Some(d), Some(r)) => {
                if d + r > 1.0 + SHARE_EPSILON {
                    return Err(RowError::SharesExceedOne { dem: d, rep: r });
                }
                Some((1.0 - d - r).max(0.0))
            }
            _ => None,
        };
        let winner_party = winner_of(dem, rep, other);

        let directory = nominees::for_year(year);
        let dem_name = pick_name(self._dem_name, directory.and_then(|n| n.name_of(Party::Dem)));
        let rep_name = pick_name(self._rep_name, directory.and_then(|n| n.name_of(Party::Rep)));
        let (winner_name, runner_up_name) = match winner_party {
            Party::Dem => (dem_name.clone(), rep_name.clone()),
            Party::Rep => (rep_name.clone(), dem_name.clone()),
            Party::Oth => (String::new(), String::new()),
        };

        Ok(ElectionRecord {
            year,
            state_fips: self._state.state_fips(),
            state_name: self._state.name.to_string(),
            state_abbr: self._state.abbr.to_string(),
            electoral_votes: self._electoral_votes,
            dem_share: dem,
            rep_share: rep,
            other_share: other,
            winner_party,
            winner_name,
            runner_up_name,
            dem_candidate_name: dem_name,
            rep_candidate_name: rep_name,
        })
    }
}

fn check_share(field: &'static str, share: Option<f64>) -> Result<Option<f64>, RowError> {
    match share {
        Some(x) if !(0.0..=1.0).contains(&x) => {
            Err(RowError::ShareOutOfRange { field, value: x })
        }
        x => Ok(x),
    }
}

// A third party only carries the state when it beats both majors.
fn winner_of(dem: Option<f64>, rep: Option<f64>, other: Option<f64>) -> Party {
    match (dem, rep, other) {
        (Some(d), Some(r), Some(o)) if d > r && d >= o => Party::Dem,
        (Some(d), Some(r), Some(o)) if r > d && r >= o => Party::Rep,
        _ => Party::Oth,
    }
}

fn pick_name(given: Option<String>, fallback: Option<&'static str>) -> String {
    match given {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => fallback.unwrap_or_default().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::states;

    fn state(abbr: &str) -> &'static StateInfo {
        states::by_abbr(abbr).unwrap()
    }

    #[test]
    fn other_share_completes_the_total() {
        let r = RecordBuilder::new(2000, state("CA"))
            .shares(Some(0.5345), Some(0.4165))
            .build()
            .unwrap();
        let other = r.other_share().unwrap();
        assert!((other - 0.049).abs() < 1e-9);
        let total = r.dem_share().unwrap() + r.rep_share().unwrap() + other;
        assert!((total - 1.0).abs() < 1e-12);
        assert_eq!(r.winner_party(), Party::Dem);
        assert_eq!(r.runner_up_name(), "George W. Bush");
    }

    #[test]
    fn unknown_share_means_other_winner() {
        let r = RecordBuilder::new(1976, state("TX"))
            .shares(Some(0.51), None)
            .build()
            .unwrap();
        assert_eq!(r.winner_party(), Party::Oth);
        assert_eq!(r.other_share(), None);
        assert_eq!(r.winner_name(), "");
        assert_eq!(r.dem_candidate_name(), "Jimmy Carter");
    }

    #[test]
    fn third_party_carrying_a_state() {
        // 1968 Alabama: Wallace ahead of both majors.
        let r = RecordBuilder::new(1968, state("AL"))
            .shares(Some(0.188), Some(0.14))
            .build()
            .unwrap();
        assert_eq!(r.winner_party(), Party::Oth);
    }

    #[test]
    fn tie_is_not_attributed() {
        let r = RecordBuilder::new(2000, state("FL"))
            .shares(Some(0.49), Some(0.49))
            .build()
            .unwrap();
        assert_eq!(r.winner_party(), Party::Oth);
    }

    #[test]
    fn shares_above_one_are_rejected() {
        let res = RecordBuilder::new(2000, state("CA"))
            .shares(Some(0.7), Some(0.4))
            .build();
        assert!(matches!(res, Err(RowError::SharesExceedOne { .. })));
        let res = RecordBuilder::new(2000, state("CA"))
            .shares(Some(1.2), None)
            .build();
        assert!(matches!(res, Err(RowError::ShareOutOfRange { .. })));
    }

    #[test]
    fn rounding_overflow_clamps_to_zero() {
        let r = RecordBuilder::new(1964, state("DC"))
            .shares(Some(0.855), Some(0.145 + 1e-12))
            .build()
            .unwrap();
        assert_eq!(r.other_share(), Some(0.0));
    }

    #[test]
    fn years_are_checked() {
        for y in [1944, 1950, 2024] {
            let res = RecordBuilder::new(y, state("OH")).build();
            assert_eq!(res, Err(RowError::YearOutOfRange(y)));
        }
    }

    #[test]
    fn explicit_names_win_over_directory() {
        let r = RecordBuilder::new(2016, state("NY"))
            .shares(Some(0.59), Some(0.365))
            .candidates(Some("H. Clinton".to_string()), Some(" ".to_string()))
            .build()
            .unwrap();
        assert_eq!(r.winner_name(), "H. Clinton");
        assert_eq!(r.rep_candidate_name(), "Donald Trump");
    }
}
