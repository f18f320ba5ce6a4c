pub mod manager;
pub mod models;
pub mod orchestrator;
pub mod reference;
pub mod repository;
pub mod seating;
pub mod trips;

pub use manager::{BookingError, BookingManager, CancelRequest};
pub use models::{
    Booking, BookingRecord, BookingStatus, Customer, CustomerLookup, NewBooking, NewBookingRecord,
    NewCustomer, PassengerEntry,
};
pub use orchestrator::{CheckoutError, CheckoutReceipt, CheckoutService, CheckoutSession, MockPaymentAdapter};
pub use repository::{BookingRecordRepository, BookingRepository};
pub use trips::{group_trips, MyBookings, TripGroups, TripView};
