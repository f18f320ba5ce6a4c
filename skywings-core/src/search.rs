use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::flight::Flight;
use crate::status::{effective_flight_status, FlightStatus};
use crate::CoreError;

/// Raw query string of the search page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightSearchParams {
    pub origin: Option<String>,
    pub destination: Option<String>,
    /// `YYYY-MM-DD` or an ISO datetime; only the date part is used
    pub depart: Option<String>,
    pub passengers: Option<u32>,
}

/// Normalized filters. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightSearchQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date: Option<NaiveDate>,
}

impl FlightSearchQuery {
    pub fn from_params(params: &FlightSearchParams) -> Result<Self, CoreError> {
        let date = match non_empty(params.depart.as_deref()) {
            Some(raw) => Some(parse_depart_date(&raw)?),
            None => None,
        };

        Ok(Self {
            origin: non_empty(params.origin.as_deref()).map(|s| s.to_ascii_uppercase()),
            destination: non_empty(params.destination.as_deref()).map(|s| s.to_ascii_uppercase()),
            date,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.origin.is_none() && self.destination.is_none() && self.date.is_none()
    }

    /// UTC day covered by the date filter: `[00:00, next 00:00)`.
    pub fn day_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.date.map(|date| {
            let start = date.and_time(NaiveTime::MIN).and_utc();
            (start, start + Duration::days(1))
        })
    }

    pub fn matches(&self, flight: &Flight) -> bool {
        if let Some(origin) = &self.origin {
            if !flight.origin.eq_ignore_ascii_case(origin) {
                return false;
            }
        }
        if let Some(destination) = &self.destination {
            if !flight.destination.eq_ignore_ascii_case(destination) {
                return false;
            }
        }
        if let Some((start, end)) = self.day_window() {
            if flight.depart_time < start || flight.depart_time >= end {
                return false;
            }
        }
        true
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

pub fn parse_depart_date(raw: &str) -> Result<NaiveDate, CoreError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt.date());
        }
    }
    Err(CoreError::ValidationError(format!(
        "Invalid departure date {:?}, expected YYYY-MM-DD",
        raw
    )))
}

#[derive(Debug, Serialize)]
pub struct FlightSearchResult {
    /// False when no filter was given, mirroring the empty search page
    pub searched: bool,
    pub flights: Vec<FlightOption>,
}

#[derive(Debug, Serialize)]
pub struct FlightOption {
    pub flight_id: i64,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price_cents: i64,
    pub formatted_price: String,
    pub status: FlightStatus,
}

impl FlightOption {
    pub fn from_flight(flight: &Flight, now: DateTime<Utc>) -> Self {
        Self {
            flight_id: flight.id,
            flight_number: flight.flight_number(),
            origin: flight.origin.clone(),
            destination: flight.destination.clone(),
            departure_time: flight.depart_time,
            arrival_time: flight.arrival_time(),
            price_cents: flight.price_cents,
            formatted_price: skywings_shared::format_cents(flight.price_cents),
            status: effective_flight_status(flight, now),
        }
    }
}
