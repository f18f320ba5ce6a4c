pub mod account;
pub mod context;
pub mod flight;
pub mod inquiry;
pub mod payment;
pub mod repository;
pub mod search;
pub mod status;

pub use context::{BookingContext, BookingStage, LeadPassenger, PassengerPreference};
pub use account::{NewTraveler, NewUser, ProfileUpdate, Registration, Traveler, User};
pub use flight::{Flight, NewFlight, RouteCount};
pub use inquiry::{ContactForm, ContactMessage, NewContactMessage, NewSubscriber, SubscribeForm, Subscriber};
pub use payment::{PaymentAdapter, PaymentError, PaymentMethod, PaymentReceipt, PaymentRequest, PaymentSource};
pub use repository::{
    BookingContextStore, ContactRepository, FleetRepository, FlightRepository, RateLimiter, RepoError, RepoResult,
    SubscriberRepository, TravelerRepository, UserRepository,
};
pub use search::{FlightSearchParams, FlightSearchQuery};
pub use status::FlightStatus;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
