use async_trait::async_trait;
use skywings_core::RepoResult;

use crate::models::{
    Booking, BookingRecord, Customer, CustomerLookup, NewBooking, NewBookingRecord, NewCustomer,
};

/// Account bookings
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &NewBooking) -> RepoResult<Booking>;

    async fn list_for_user(&self, user_id: i64) -> RepoResult<Vec<Booking>>;

    /// `None` unless the booking exists and belongs to `user_id`.
    async fn get_for_user(&self, id: i64, user_id: i64) -> RepoResult<Option<Booking>>;

    async fn find_by_reference(&self, booking_reference: &str) -> RepoResult<Option<Booking>>;

    async fn list_for_flight(&self, flight_id: i64) -> RepoResult<Vec<Booking>>;

    async fn update(&self, booking: &Booking) -> RepoResult<()>;
}

/// Session funnel bookings and their contacts
#[async_trait]
pub trait BookingRecordRepository: Send + Sync {
    async fn create_customer(&self, customer: &NewCustomer) -> RepoResult<Customer>;

    async fn create(&self, record: &NewBookingRecord) -> RepoResult<BookingRecord>;

    async fn find_by_ref(&self, booking_ref: &str) -> RepoResult<Option<BookingRecord>>;

    /// Newest first.
    async fn list_for_owner(&self, owner: &str) -> RepoResult<Vec<BookingRecord>>;

    async fn list_for_flight(&self, flight_id: i64) -> RepoResult<Vec<BookingRecord>>;

    /// Writes back status, passengers and the updated timestamp.
    async fn update(&self, record: &BookingRecord) -> RepoResult<()>;

    /// Records joined with their customer, at most `CustomerLookup::MAX_ROWS`.
    async fn lookup(&self, lookup: &CustomerLookup) -> RepoResult<Vec<(BookingRecord, Customer)>>;

    async fn customer(&self, id: i64) -> RepoResult<Option<Customer>>;
}
