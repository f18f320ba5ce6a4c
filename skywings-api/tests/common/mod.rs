#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use skywings_api::{app, AppState};
use skywings_catalog::{AircraftType, CabinClass, ClassBand, PricingConfig};
use skywings_core::account::hash_password;
use skywings_core::repository::{FleetRepository, FlightRepository, UserRepository};
use skywings_core::{Flight, NewFlight, NewUser};
use skywings_store::app_config::{
    AuthConfig, BusinessRules, Config, DatabaseConfig, PaymentsConfig, RedisConfig, ServerConfig,
    StorageConfig,
};
use skywings_store::MemoryStore;

pub const DECLINED_CARD: &str = "4000000000000002";
pub const STAFF_EMAIL: &str = "ops@skywings.test";
pub const STAFF_PASSWORD: &str = "control-tower";

pub fn test_config() -> Config {
    Config {
        server: ServerConfig { port: 0 },
        storage: StorageConfig::default(),
        database: DatabaseConfig { url: String::new(), max_connections: 1 },
        redis: RedisConfig { url: String::new() },
        auth: AuthConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_expiration_seconds: 3600,
        },
        business_rules: BusinessRules {
            session_ttl_seconds: 3600,
            rebook_cutoff_minutes: 120,
            rate_limit_per_minute: 10_000,
        },
        pricing: PricingConfig::default(),
        payments: PaymentsConfig { decline_card_number: Some(DECLINED_CARD.to_string()) },
    }
}

pub struct Harness {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new(3600));
    let state = AppState::with_memory_store(store.clone(), &test_config());
    let server = TestServer::new(app(state)).expect("Failed to create test server");
    Harness { server, store }
}

/// Narrow-body with two Business rows and three Economy rows of `ABC-DEF`.
pub async fn seed_aircraft(store: &MemoryStore) -> AircraftType {
    store
        .create_aircraft_type(&AircraftType {
            id: 0,
            code: "A320".to_string(),
            name: "Airbus A320".to_string(),
            total_rows: 5,
            layout: "ABC-DEF".to_string(),
            class_map: vec![
                ClassBand { from_row: 1, to_row: 2, cabin: CabinClass::Business },
                ClassBand { from_row: 3, to_row: 5, cabin: CabinClass::Economy },
            ],
        })
        .await
        .expect("aircraft type")
}

pub async fn seed_flight(
    store: &MemoryStore,
    origin: &str,
    destination: &str,
    depart_time: DateTime<Utc>,
    price_cents: i64,
    aircraft: Option<&AircraftType>,
) -> Flight {
    let flight = FlightRepository::create(
        store,
        &NewFlight {
            origin: origin.to_string(),
            destination: destination.to_string(),
            depart_time,
            price_cents,
            aircraft_type_id: aircraft.map(|a| a.id),
        },
    )
    .await
    .expect("flight");

    if let Some(aircraft) = aircraft {
        store
            .create_seats(flight.id, &aircraft.generate_seats())
            .await
            .expect("seats");
    }
    flight
}

/// YYZ → LHR three days out at $220.00, with seats.
pub async fn seed_bookable_flight(store: &MemoryStore) -> Flight {
    let aircraft = seed_aircraft(store).await;
    seed_flight(store, "YYZ", "LHR", Utc::now() + Duration::days(3), 22000, Some(&aircraft)).await
}

pub async fn seed_staff(store: &MemoryStore) {
    UserRepository::create(
        store,
        &NewUser {
            email: STAFF_EMAIL.to_string(),
            password_hash: hash_password(STAFF_PASSWORD).expect("hash"),
            first_name: Some("Olu".to_string()),
            last_name: Some("Ops".to_string()),
            phone: None,
            is_staff: true,
        },
    )
    .await
    .expect("staff user");
}

pub async fn guest_token(server: &TestServer) -> String {
    let response = server.post("/auth/guest").await;
    response.assert_status_ok();
    token_of(&response.json::<Value>())
}

pub async fn login(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/auth/login")
        .json(&serde_json::json!({ "email": email, "password": password }))
        .await;
    response.assert_status_ok();
    token_of(&response.json::<Value>())
}

/// Registers a customer and returns `(token, user id)`.
pub async fn register(server: &TestServer, email: &str) -> (String, i64) {
    let response = server
        .post("/auth/register")
        .json(&serde_json::json!({
            "email": email,
            "password": "s3cure-pass",
            "confirm_password": "s3cure-pass",
            "first_name": "Ada",
            "last_name": "Lovelace",
        }))
        .await;
    assert_eq!(response.status_code(), axum::http::StatusCode::CREATED);
    let body = response.json::<Value>();
    let user_id = body["user"]["id"].as_i64().expect("user id");
    (token_of(&body), user_id)
}

fn token_of(body: &Value) -> String {
    body["token"].as_str().expect("token").to_string()
}

/// Runs a session through flight pick, seats and passengers.
pub async fn fill_funnel(server: &TestServer, token: &str, flight: &Flight) {
    server
        .post("/booking/start")
        .authorization_bearer(token)
        .json(&serde_json::json!({ "flight_id": flight.id, "passengers": 2 }))
        .await
        .assert_status_ok();

    server
        .post("/booking/seats")
        .authorization_bearer(token)
        .json(&serde_json::json!({ "seats": ["1A", "3C"] }))
        .await
        .assert_status_ok();

    server
        .post("/booking/passengers")
        .authorization_bearer(token)
        .json(&serde_json::json!({
            "lead": {
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": "ada@example.com",
                "phone": "416-555-0199"
            },
            "passengers": [
                { "cabin": "Business" },
                { "full_name": "Charles Babbage", "cabin": "Economy", "extra_bags": 1 }
            ],
            "billing_country": "CA"
        }))
        .await
        .assert_status_ok();
}
