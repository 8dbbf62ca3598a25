//! Major-party nominees of each presidential election.
//!
//! The scraped results tables list the national winner's party first, which
//! is what `winner` is used for when reading them.

use crate::records::Party;

#[derive(Eq, PartialEq, Debug)]
pub struct Nominees {
    pub year: u32,
    pub democrat: &'static str,
    pub republican: &'static str,
    /// The party that won the presidency that year.
    pub winner: Party,
}

impl Nominees {
    pub fn name_of(&self, party: Party) -> Option<&'static str> {
        match party {
            Party::Dem => Some(self.democrat),
            Party::Rep => Some(self.republican),
            Party::Oth => None,
        }
    }
}

const fn n(year: u32, democrat: &'static str, republican: &'static str, winner: Party) -> Nominees {
    Nominees {
        year,
        democrat,
        republican,
        winner,
    }
}

pub const NOMINEES: [Nominees; 19] = [
    n(1948, "Harry S. Truman", "Thomas E. Dewey", Party::Dem),
    n(1952, "Adlai Stevenson", "Dwight D. Eisenhower", Party::Rep),
    n(1956, "Adlai Stevenson", "Dwight D. Eisenhower", Party::Rep),
    n(1960, "John F. Kennedy", "Richard Nixon", Party::Dem),
    n(1964, "Lyndon B. Johnson", "Barry Goldwater", Party::Dem),
    n(1968, "Hubert Humphrey", "Richard Nixon", Party::Rep),
    n(1972, "George McGovern", "Richard Nixon", Party::Rep),
    n(1976, "Jimmy Carter", "Gerald Ford", Party::Dem),
    n(1980, "Jimmy Carter", "Ronald Reagan", Party::Rep),
    n(1984, "Walter Mondale", "Ronald Reagan", Party::Rep),
    n(1988, "Michael Dukakis", "George H. W. Bush", Party::Rep),
    n(1992, "Bill Clinton", "George H. W. Bush", Party::Dem),
    n(1996, "Bill Clinton", "Bob Dole", Party::Dem),
    n(2000, "Al Gore", "George W. Bush", Party::Rep),
    n(2004, "John Kerry", "George W. Bush", Party::Rep),
    n(2008, "Barack Obama", "John McCain", Party::Dem),
    n(2012, "Barack Obama", "Mitt Romney", Party::Dem),
    n(2016, "Hillary Clinton", "Donald Trump", Party::Rep),
    n(2020, "Joe Biden", "Donald Trump", Party::Dem),
];

pub fn for_year(year: u32) -> Option<&'static Nominees> {
    NOMINEES.iter().find(|x| x.year == year)
}
