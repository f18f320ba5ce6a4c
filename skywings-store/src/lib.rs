pub mod account_repo;
pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod flight_repo;
pub mod inquiry_repo;
pub mod memory;
pub mod redis_repo;

pub use account_repo::{PostgresTravelerRepository, PostgresUserRepository};
pub use booking_repo::{PostgresBookingRecordRepository, PostgresBookingRepository};
pub use database::DbClient;
pub use flight_repo::{PostgresFleetRepository, PostgresFlightRepository};
pub use inquiry_repo::{PostgresContactRepository, PostgresSubscriberRepository};
pub use memory::MemoryStore;
pub use redis_repo::{RedisClient, RedisContextStore};
