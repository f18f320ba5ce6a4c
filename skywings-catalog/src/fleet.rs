use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Fare tier of a seat or passenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum CabinClass {
    Economy,
    Premium,
    Business,
    First,
}

impl CabinClass {
    pub const ALL: [CabinClass; 4] = [
        CabinClass::Economy,
        CabinClass::Premium,
        CabinClass::Business,
        CabinClass::First,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CabinClass::Economy => "Economy",
            CabinClass::Premium => "Premium",
            CabinClass::Business => "Business",
            CabinClass::First => "First",
        }
    }

    /// Like `from_str` but falls back to Economy for anything unrecognized.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or(CabinClass::Economy)
    }
}

impl Default for CabinClass {
    fn default() -> Self {
        CabinClass::Economy
    }
}

impl fmt::Display for CabinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CabinClass {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "economy" | "coach" | "main" => Ok(CabinClass::Economy),
            "premium" | "premium economy" => Ok(CabinClass::Premium),
            "business" => Ok(CabinClass::Business),
            "first" | "first class" => Ok(CabinClass::First),
            _ => Err(FleetError::UnknownCabin(s.to_string())),
        }
    }
}

impl From<String> for CabinClass {
    fn from(value: String) -> Self {
        CabinClass::parse_lenient(&value)
    }
}

/// Inclusive row range mapped to a cabin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassBand {
    pub from_row: i32,
    pub to_row: i32,
    pub cabin: CabinClass,
}

impl ClassBand {
    pub fn contains(&self, row: i32) -> bool {
        row >= self.from_row && row <= self.to_row
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AircraftType {
    /// Assigned by the store
    #[serde(default)]
    pub id: i64,
    pub code: String,
    pub name: String,
    pub total_rows: i32,
    /// Seat letters grouped by aisle section, e.g. `ABC-DEF`.
    pub layout: String,
    pub class_map: Vec<ClassBand>,
}

/// A seat to be generated for a flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatSpec {
    pub row: i32,
    pub letter: char,
    pub cabin: CabinClass,
}

impl SeatSpec {
    pub fn code(&self) -> String {
        seat_code(self.row, self.letter)
    }
}

/// A generated seat row as stored per flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    pub flight_id: i64,
    pub row_num: i32,
    pub seat_letter: String,
    pub cabin: CabinClass,
    pub is_blocked: bool,
}

impl Seat {
    pub fn code(&self) -> String {
        format!("{}{}", self.row_num, self.seat_letter)
    }
}

pub fn seat_code(row: i32, letter: char) -> String {
    format!("{}{}", row, letter)
}

/// Splits a code like `12A` into its row and letter. Input is trimmed and
/// uppercased first.
pub fn parse_seat_code(code: &str) -> Option<(i32, char)> {
    let code = code.trim().to_ascii_uppercase();
    let letter = code.chars().last()?;
    if !letter.is_ascii_uppercase() {
        return None;
    }
    let digits = &code[..code.len() - 1];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let row: i32 = digits.parse().ok()?;
    if row <= 0 {
        return None;
    }
    Some((row, letter))
}

impl AircraftType {
    /// Seat letters in layout order, ignoring aisle separators.
    pub fn seat_letters(&self) -> Vec<char> {
        self.layout
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .collect()
    }

    pub fn cabin_for_row(&self, row: i32) -> CabinClass {
        self.class_map
            .iter()
            .find(|band| band.contains(row))
            .map(|band| band.cabin)
            .unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), FleetError> {
        if self.code.trim().is_empty() {
            return Err(FleetError::InvalidAircraft("code is required".to_string()));
        }
        if self.total_rows <= 0 {
            return Err(FleetError::InvalidAircraft(format!(
                "total_rows must be positive, got {}",
                self.total_rows
            )));
        }

        let letters = self.seat_letters();
        if letters.is_empty() {
            return Err(FleetError::InvalidLayout(self.layout.clone()));
        }
        let unique: HashSet<char> = letters.iter().copied().collect();
        if unique.len() != letters.len() {
            return Err(FleetError::InvalidLayout(self.layout.clone()));
        }
        let allowed = |c: char| c.is_ascii_alphabetic() || matches!(c, '-' | '_' | '|' | ' ');
        if !self.layout.chars().all(allowed) {
            return Err(FleetError::InvalidLayout(self.layout.clone()));
        }

        for band in &self.class_map {
            if band.from_row < 1 || band.from_row > band.to_row || band.to_row > self.total_rows {
                return Err(FleetError::InvalidBand {
                    from_row: band.from_row,
                    to_row: band.to_row,
                    total_rows: self.total_rows,
                });
            }
        }

        Ok(())
    }

    /// Every seat of the cabin, row by row in layout order.
    pub fn generate_seats(&self) -> Vec<SeatSpec> {
        let letters = self.seat_letters();
        let mut seats = Vec::with_capacity(letters.len() * self.total_rows.max(0) as usize);
        for row in 1..=self.total_rows {
            let cabin = self.cabin_for_row(row);
            for letter in &letters {
                seats.push(SeatSpec { row, letter: *letter, cabin });
            }
        }
        seats
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error("Unknown cabin class: {0}")]
    UnknownCabin(String),

    #[error("Invalid seat layout: {0:?}")]
    InvalidLayout(String),

    #[error("Invalid aircraft type: {0}")]
    InvalidAircraft(String),

    #[error("Class band {from_row}-{to_row} outside 1-{total_rows}")]
    InvalidBand {
        from_row: i32,
        to_row: i32,
        total_rows: i32,
    },
}
