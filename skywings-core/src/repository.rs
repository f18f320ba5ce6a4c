use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skywings_catalog::{AircraftType, Seat, SeatSpec};

use crate::account::{NewTraveler, NewUser, ProfileUpdate, Traveler, User};
use crate::context::BookingContext;
use crate::flight::{Flight, NewFlight, RouteCount};
use crate::inquiry::{ContactMessage, NewContactMessage, NewSubscriber, Subscriber};
use crate::search::FlightSearchQuery;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Already exists: {0}")]
    Duplicate(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository trait for flight data access
#[async_trait]
pub trait FlightRepository: Send + Sync {
    /// Flights matching the filters, earliest departure first.
    async fn search(&self, query: &FlightSearchQuery) -> RepoResult<Vec<Flight>>;

    async fn get(&self, id: i64) -> RepoResult<Option<Flight>>;

    /// Flights departing in `[start, end)`, earliest first.
    async fn list_departing_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepoResult<Vec<Flight>>;

    async fn create(&self, flight: &NewFlight) -> RepoResult<Flight>;

    /// Returns false when the flight does not exist.
    async fn update_status(&self, id: i64, status: &str, note: Option<&str>) -> RepoResult<bool>;

    /// Flight count per route, busiest first.
    async fn route_popularity(&self) -> RepoResult<Vec<RouteCount>>;
}

/// Aircraft types and the seats generated from them
#[async_trait]
pub trait FleetRepository: Send + Sync {
    /// Stores a new aircraft type; the `id` of the argument is ignored.
    async fn create_aircraft_type(&self, aircraft: &AircraftType) -> RepoResult<AircraftType>;

    async fn get_aircraft_type(&self, id: i64) -> RepoResult<Option<AircraftType>>;

    async fn list_seats(&self, flight_id: i64) -> RepoResult<Vec<Seat>>;

    /// Inserts the seats that do not exist yet and returns how many were added.
    async fn create_seats(&self, flight_id: i64, seats: &[SeatSpec]) -> RepoResult<usize>;

    /// Returns false when the seat does not exist.
    async fn set_seat_blocked(
        &self,
        flight_id: i64,
        row: i32,
        letter: char,
        blocked: bool,
    ) -> RepoResult<bool>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `RepoError::Duplicate` when the email is taken.
    async fn create(&self, user: &NewUser) -> RepoResult<User>;

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    async fn get(&self, id: i64) -> RepoResult<Option<User>>;

    async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> RepoResult<Option<User>>;
}

#[async_trait]
pub trait TravelerRepository: Send + Sync {
    async fn list(&self, user_id: i64) -> RepoResult<Vec<Traveler>>;

    async fn create(&self, user_id: i64, traveler: &NewTraveler) -> RepoResult<Traveler>;

    /// Deletes only when the traveler belongs to `user_id`.
    async fn delete(&self, user_id: i64, traveler_id: i64) -> RepoResult<bool>;
}

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create(&self, message: &NewContactMessage) -> RepoResult<ContactMessage>;
}

#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    /// Inserts, or refreshes the existing subscriber with the same email.
    async fn upsert(&self, subscriber: &NewSubscriber) -> RepoResult<Subscriber>;
}

/// Per-session booking context, keyed by session id
#[async_trait]
pub trait BookingContextStore: Send + Sync {
    async fn load(&self, session_id: &str) -> RepoResult<Option<BookingContext>>;

    async fn save(&self, session_id: &str, context: &BookingContext) -> RepoResult<()>;

    async fn clear(&self, session_id: &str) -> RepoResult<()>;
}

/// Fixed-window request counter
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Counts one hit for `key` and returns whether it is still within `limit`
    /// for the current window.
    async fn check(&self, key: &str, limit: u32, window_secs: u64) -> RepoResult<bool>;
}
