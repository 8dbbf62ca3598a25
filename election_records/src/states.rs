//! Directory of the states (and the District of Columbia) that cast
//! electoral votes.

use crate::records::StateFips;

#[derive(Eq, PartialEq, Debug)]
pub struct StateInfo {
    pub fips: &'static str,
    pub abbr: &'static str,
    pub name: &'static str,
}

impl StateInfo {
    pub fn state_fips(&self) -> StateFips {
        // The table only holds padded codes.
        StateFips(self.fips.to_string())
    }
}

const fn st(fips: &'static str, abbr: &'static str, name: &'static str) -> StateInfo {
    StateInfo { fips, abbr, name }
}

pub const STATES: [StateInfo; 51] = [
    st("01", "AL", "Alabama"),
    st("02", "AK", "Alaska"),
    st("04", "AZ", "Arizona"),
    st("05", "AR", "Arkansas"),
    st("06", "CA", "California"),
    st("08", "CO", "Colorado"),
    st("09", "CT", "Connecticut"),
    st("10", "DE", "Delaware"),
    st("11", "DC", "District of Columbia"),
    st("12", "FL", "Florida"),
    st("13", "GA", "Georgia"),
    st("15", "HI", "Hawaii"),
    st("16", "ID", "Idaho"),
    st("17", "IL", "Illinois"),
    st("18", "IN", "Indiana"),
    st("19", "IA", "Iowa"),
    st("20", "KS", "Kansas"),
    st("21", "KY", "Kentucky"),
    st("22", "LA", "Louisiana"),
    st("23", "ME", "Maine"),
    st("24", "MD", "Maryland"),
    st("25", "MA", "Massachusetts"),
    st("26", "MI", "Michigan"),
    st("27", "MN", "Minnesota"),
    st("28", "MS", "Mississippi"),
    st("29", "MO", "Missouri"),
    st("30", "MT", "Montana"),
    st("31", "NE", "Nebraska"),
    st("32", "NV", "Nevada"),
    st("33", "NH", "New Hampshire"),
    st("34", "NJ", "New Jersey"),
    st("35", "NM", "New Mexico"),
    st("36", "NY", "New York"),
    st("37", "NC", "North Carolina"),
    st("38", "ND", "North Dakota"),
    st("39", "OH", "Ohio"),
    st("40", "OK", "Oklahoma"),
    st("41", "OR", "Oregon"),
    st("42", "PA", "Pennsylvania"),
    st("44", "RI", "Rhode Island"),
    st("45", "SC", "South Carolina"),
    st("46", "SD", "South Dakota"),
    st("47", "TN", "Tennessee"),
    st("48", "TX", "Texas"),
    st("49", "UT", "Utah"),
    st("50", "VT", "Vermont"),
    st("51", "VA", "Virginia"),
    st("53", "WA", "Washington"),
    st("54", "WV", "West Virginia"),
    st("55", "WI", "Wisconsin"),
    st("56", "WY", "Wyoming"),
];

/// Looks up a state by postal abbreviation, ignoring case and surrounding spaces.
pub fn by_abbr(abbr: &str) -> Option<&'static StateInfo> {
    let a = abbr.trim();
    STATES.iter().find(|s| s.abbr.eq_ignore_ascii_case(a))
}

pub fn by_fips(fips: &StateFips) -> Option<&'static StateInfo> {
    STATES.iter().find(|s| s.fips == fips.as_str())
}

/// Looks up a state by its full name, ignoring case.
pub fn by_name(name: &str) -> Option<&'static StateInfo> {
    let n = name.trim();
    STATES.iter().find(|s| s.name.eq_ignore_ascii_case(n))
}
