use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::fleet::{parse_seat_code, CabinClass, Seat};

/// Seats of one flight, indexed by code, plus the codes already taken by
/// confirmed bookings.
#[derive(Debug, Clone, Default)]
pub struct SeatMap {
    seats: HashMap<String, SeatInfo>,
    occupied: HashSet<String>,
}

#[derive(Debug, Clone, Copy)]
struct SeatInfo {
    cabin: CabinClass,
    blocked: bool,
}

/// Outcome of validating a seat submission: one slot per submitted code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSelection {
    pub seats: Vec<Option<String>>,
    pub rejected: Vec<String>,
}

impl SeatMap {
    pub fn new<I, S>(seats: &[Seat], occupied: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let seats = seats
            .iter()
            .map(|seat| {
                (
                    seat.code().to_ascii_uppercase(),
                    SeatInfo { cabin: seat.cabin, blocked: seat.is_blocked },
                )
            })
            .collect();
        let occupied = occupied
            .into_iter()
            .filter_map(|code| normalize(code.as_ref()))
            .collect();
        Self { seats, occupied }
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        normalize(code).is_some_and(|c| self.seats.contains_key(&c))
    }

    pub fn cabin_of(&self, code: &str) -> Option<CabinClass> {
        normalize(code).and_then(|c| self.seats.get(&c).map(|info| info.cabin))
    }

    /// A seat can be taken if it exists on this flight, is not blocked and
    /// no confirmed booking holds it.
    pub fn is_selectable(&self, code: &str) -> bool {
        let Some(code) = normalize(code) else {
            return false;
        };
        match self.seats.get(&code) {
            Some(info) => !info.blocked && !self.occupied.contains(&code),
            None => false,
        }
    }

    pub fn blocked_codes(&self) -> Vec<String> {
        let codes: BTreeSet<_> = self
            .seats
            .iter()
            .filter(|(_, info)| info.blocked)
            .map(|(code, _)| code.clone())
            .collect();
        sort_codes(codes)
    }

    pub fn occupied_codes(&self) -> Vec<String> {
        let codes: BTreeSet<_> = self
            .occupied
            .iter()
            .filter(|code| self.seats.contains_key(*code))
            .cloned()
            .collect();
        sort_codes(codes)
    }

    /// Checks each submitted code against the flight. Unknown, blocked,
    /// occupied and repeated codes come back as `None` and are listed in
    /// `rejected`; empty slots stay `None` without being reported.
    pub fn validate_selection<S: AsRef<str>>(&self, codes: &[Option<S>]) -> SeatSelection {
        let mut taken = HashSet::new();
        let mut seats = Vec::with_capacity(codes.len());
        let mut rejected = Vec::new();

        for code in codes {
            let raw = match code {
                Some(raw) if !raw.as_ref().trim().is_empty() => raw.as_ref(),
                _ => {
                    seats.push(None);
                    continue;
                }
            };

            match normalize(raw) {
                Some(code) if self.is_selectable(&code) && taken.insert(code.clone()) => {
                    seats.push(Some(code));
                }
                _ => {
                    rejected.push(raw.trim().to_string());
                    seats.push(None);
                }
            }
        }

        SeatSelection { seats, rejected }
    }
}

fn normalize(code: &str) -> Option<String> {
    parse_seat_code(code).map(|(row, letter)| format!("{}{}", row, letter))
}

/// Orders codes by row number, then letter.
fn sort_codes(codes: BTreeSet<String>) -> Vec<String> {
    let mut codes: Vec<String> = codes.into_iter().collect();
    codes.sort_by_key(|code| parse_seat_code(code).unwrap_or((i32::MAX, 'Z')));
    codes
}
