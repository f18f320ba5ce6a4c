use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::flight::Flight;

/// Minutes after departure before a flight counts as gone.
pub const DEPARTED_AFTER_MINUTES: i64 = 30;
/// Boarding starts this many minutes before departure.
pub const BOARDING_LEAD_MINUTES: i64 = 15;
pub const ON_TIME_HORIZON_HOURS: i64 = 2;

/// Status recomputed from the wall clock on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightStatus {
    Scheduled,
    OnTime,
    Boarding,
    Departed,
    Delayed,
    Canceled,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::Scheduled => "Scheduled",
            FlightStatus::OnTime => "On time",
            FlightStatus::Boarding => "Boarding",
            FlightStatus::Departed => "Departed",
            FlightStatus::Delayed => "Delayed",
            FlightStatus::Canceled => "Cancelled",
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FlightStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

pub fn derive_flight_status(now: DateTime<Utc>, depart_time: DateTime<Utc>) -> FlightStatus {
    let departed_cutoff = now - Duration::minutes(DEPARTED_AFTER_MINUTES);
    let boarding_until = now + Duration::minutes(BOARDING_LEAD_MINUTES);
    let on_time_until = now + Duration::hours(ON_TIME_HORIZON_HOURS);

    if depart_time < departed_cutoff {
        FlightStatus::Departed
    } else if depart_time <= boarding_until {
        FlightStatus::Boarding
    } else if depart_time <= on_time_until {
        FlightStatus::OnTime
    } else {
        FlightStatus::Scheduled
    }
}

/// Derived status, unless staff marked the flight canceled or delayed.
/// A delay stops mattering once the flight has departed.
pub fn effective_flight_status(flight: &Flight, now: DateTime<Utc>) -> FlightStatus {
    if flight.is_canceled() {
        return FlightStatus::Canceled;
    }
    let derived = derive_flight_status(now, flight.depart_time);
    let delayed = flight
        .status
        .as_deref()
        .is_some_and(|s| s.to_ascii_lowercase().contains("delay"));
    if delayed && derived != FlightStatus::Departed {
        FlightStatus::Delayed
    } else {
        derived
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minutes_from_now: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        (now, now + Duration::minutes(minutes_from_now))
    }

    #[test]
    fn test_status_windows() {
        let cases = [
            (-31, FlightStatus::Departed),
            (-30, FlightStatus::Boarding),
            (0, FlightStatus::Boarding),
            (15, FlightStatus::Boarding),
            (16, FlightStatus::OnTime),
            (120, FlightStatus::OnTime),
            (121, FlightStatus::Scheduled),
        ];
        for (offset, expected) in cases {
            let (now, depart) = at(offset);
            assert_eq!(derive_flight_status(now, depart), expected, "offset {}", offset);
        }
    }

    #[test]
    fn test_staff_overrides() {
        let (now, depart) = at(300);
        let mut flight = Flight {
            id: 1,
            origin: "YYZ".to_string(),
            destination: "JFK".to_string(),
            depart_time: depart,
            price_cents: 0,
            aircraft_type_id: None,
            status: Some("Delayed".to_string()),
            status_note: Some("Crew swap".to_string()),
        };
        assert_eq!(effective_flight_status(&flight, now), FlightStatus::Delayed);

        flight.status = Some("CANCELLED".to_string());
        assert_eq!(effective_flight_status(&flight, now), FlightStatus::Canceled);
        assert_eq!(FlightStatus::Canceled.to_string(), "Cancelled");
    }
}
