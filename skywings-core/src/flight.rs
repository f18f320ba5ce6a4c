use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

pub const AIRLINE_NAME: &str = "SkyWings";

/// Scheduled block time used for the arrival estimate.
pub const BLOCK_TIME_HOURS: i64 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub id: i64,
    pub origin: String,
    pub destination: String,
    pub depart_time: DateTime<Utc>,
    pub price_cents: i64,
    pub aircraft_type_id: Option<i64>,
    /// Status set by staff, e.g. "Delayed" or "Cancelled"
    pub status: Option<String>,
    pub status_note: Option<String>,
}

impl Flight {
    pub fn flight_number(&self) -> String {
        format!("SW{:04}", self.id)
    }

    /// Route code shown on staff reports, e.g. `YYZJFK-12`.
    pub fn code(&self) -> String {
        format!("{}{}-{}", self.origin, self.destination, self.id)
    }

    pub fn arrival_time(&self) -> DateTime<Utc> {
        self.depart_time + Duration::hours(BLOCK_TIME_HOURS)
    }

    pub fn is_canceled(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.to_ascii_lowercase().contains("cancel"))
    }

    /// Still bookable: departs in the future and has not been canceled.
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        self.depart_time > now && !self.is_canceled()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFlight {
    pub origin: String,
    pub destination: String,
    pub depart_time: DateTime<Utc>,
    pub price_cents: i64,
    pub aircraft_type_id: Option<i64>,
}

impl NewFlight {
    /// Uppercases the airport codes and checks the basics.
    pub fn normalized(mut self) -> Result<Self, CoreError> {
        self.origin = self.origin.trim().to_ascii_uppercase();
        self.destination = self.destination.trim().to_ascii_uppercase();

        for code in [&self.origin, &self.destination] {
            if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(CoreError::ValidationError(format!(
                    "Airport code must be three letters: {:?}",
                    code
                )));
            }
        }
        if self.origin == self.destination {
            return Err(CoreError::ValidationError(
                "Origin and destination must differ".to_string(),
            ));
        }
        if self.price_cents <= 0 {
            return Err(CoreError::ValidationError("Price must be positive".to_string()));
        }
        Ok(self)
    }
}

/// Number of scheduled flights on one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteCount {
    pub origin: String,
    pub destination: String,
    pub count: i64,
}
