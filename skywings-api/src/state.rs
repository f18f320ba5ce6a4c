use std::sync::Arc;

use skywings_catalog::PricingEngine;
use skywings_core::{
    BookingContextStore, ContactRepository, FleetRepository, FlightRepository, PaymentAdapter,
    RateLimiter, SubscriberRepository, TravelerRepository, UserRepository,
};
use skywings_order::{
    BookingManager, BookingRecordRepository, BookingRepository, CheckoutService, MockPaymentAdapter,
};
use skywings_store::app_config::{BusinessRules, Config};
use skywings_store::{
    DbClient, MemoryStore, PostgresBookingRecordRepository, PostgresBookingRepository,
    PostgresContactRepository, PostgresFleetRepository, PostgresFlightRepository,
    PostgresSubscriberRepository, PostgresTravelerRepository, PostgresUserRepository, RedisClient,
    RedisContextStore,
};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub flights: Arc<dyn FlightRepository>,
    pub fleet: Arc<dyn FleetRepository>,
    pub users: Arc<dyn UserRepository>,
    pub travelers: Arc<dyn TravelerRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub records: Arc<dyn BookingRecordRepository>,
    pub contacts: Arc<dyn ContactRepository>,
    pub subscribers: Arc<dyn SubscriberRepository>,
    pub contexts: Arc<dyn BookingContextStore>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub checkout: Arc<CheckoutService>,
    pub pricing: Arc<PricingEngine>,
    pub manager: BookingManager,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
}

/// Repository handles before the services on top of them are wired.
struct Repositories {
    flights: Arc<dyn FlightRepository>,
    fleet: Arc<dyn FleetRepository>,
    users: Arc<dyn UserRepository>,
    travelers: Arc<dyn TravelerRepository>,
    bookings: Arc<dyn BookingRepository>,
    records: Arc<dyn BookingRecordRepository>,
    contacts: Arc<dyn ContactRepository>,
    subscribers: Arc<dyn SubscriberRepository>,
    contexts: Arc<dyn BookingContextStore>,
    rate_limiter: Arc<dyn RateLimiter>,
}

impl AppState {
    /// Postgres for records, Redis for booking contexts and rate limits.
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let db = DbClient::new(&config.database.url, config.database.max_connections).await?;
        db.migrate().await?;

        let redis = RedisClient::new(&config.redis.url).await?;
        let pool = db.pool.clone();

        let repos = Repositories {
            flights: Arc::new(PostgresFlightRepository::new(pool.clone())),
            fleet: Arc::new(PostgresFleetRepository::new(pool.clone())),
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            travelers: Arc::new(PostgresTravelerRepository::new(pool.clone())),
            bookings: Arc::new(PostgresBookingRepository::new(pool.clone())),
            records: Arc::new(PostgresBookingRecordRepository::new(pool.clone())),
            contacts: Arc::new(PostgresContactRepository::new(pool.clone())),
            subscribers: Arc::new(PostgresSubscriberRepository::new(pool)),
            contexts: Arc::new(RedisContextStore::new(
                redis.clone(),
                config.business_rules.session_ttl_seconds,
            )),
            rate_limiter: Arc::new(redis),
        };
        Ok(Self::wire(repos, config))
    }

    /// Everything in process memory.
    pub fn in_memory(config: &Config) -> Self {
        Self::with_memory_store(
            Arc::new(MemoryStore::new(config.business_rules.session_ttl_seconds)),
            config,
        )
    }

    /// Shares one memory store across every repository handle, so tests can
    /// seed it directly.
    pub fn with_memory_store(store: Arc<MemoryStore>, config: &Config) -> Self {
        let repos = Repositories {
            flights: store.clone(),
            fleet: store.clone(),
            users: store.clone(),
            travelers: store.clone(),
            bookings: store.clone(),
            records: store.clone(),
            contacts: store.clone(),
            subscribers: store.clone(),
            contexts: store.clone(),
            rate_limiter: store,
        };
        Self::wire(repos, config)
    }

    fn wire(repos: Repositories, config: &Config) -> Self {
        let pricing = Arc::new(PricingEngine::new(config.pricing.clone()));
        let payments: Arc<dyn PaymentAdapter> = Arc::new(MockPaymentAdapter::new(
            config.payments.decline_card_number.clone(),
        ));
        let checkout = Arc::new(CheckoutService::new(
            repos.flights.clone(),
            repos.fleet.clone(),
            repos.records.clone(),
            repos.bookings.clone(),
            repos.contexts.clone(),
            payments,
            pricing.clone(),
        ));

        Self {
            flights: repos.flights,
            fleet: repos.fleet,
            users: repos.users,
            travelers: repos.travelers,
            bookings: repos.bookings,
            records: repos.records,
            contacts: repos.contacts,
            subscribers: repos.subscribers,
            contexts: repos.contexts,
            rate_limiter: repos.rate_limiter,
            checkout,
            pricing,
            manager: BookingManager::new(config.business_rules.rebook_cutoff_minutes),
            auth: AuthConfig {
                secret: config.auth.jwt_secret.clone(),
                expiration: config.auth.jwt_expiration_seconds,
            },
            business_rules: config.business_rules.clone(),
        }
    }
}
