//! In-process implementations of every repository, used by `storage.backend
//! = "memory"` and by the API tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skywings_catalog::{AircraftType, Seat, SeatSpec};
use skywings_core::account::{NewTraveler, NewUser, ProfileUpdate, Traveler, User};
use skywings_core::inquiry::{ContactMessage, NewContactMessage, NewSubscriber, Subscriber};
use skywings_core::repository::{
    BookingContextStore, ContactRepository, FleetRepository, FlightRepository, RateLimiter,
    SubscriberRepository, TravelerRepository, UserRepository,
};
use skywings_core::search::FlightSearchQuery;
use skywings_core::{BookingContext, Flight, NewFlight, RepoError, RepoResult, RouteCount};
use skywings_order::models::{
    Booking, BookingRecord, BookingStatus, Customer, CustomerLookup, NewBooking, NewBookingRecord,
    NewCustomer,
};
use skywings_order::repository::{BookingRecordRepository, BookingRepository};
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    next_id: i64,
    flights: BTreeMap<i64, Flight>,
    aircraft_types: BTreeMap<i64, AircraftType>,
    seats: BTreeMap<i64, Seat>,
    users: BTreeMap<i64, User>,
    travelers: BTreeMap<i64, Traveler>,
    customers: BTreeMap<i64, Customer>,
    records: BTreeMap<i64, BookingRecord>,
    bookings: BTreeMap<i64, Booking>,
    contact_messages: BTreeMap<i64, ContactMessage>,
    subscribers: BTreeMap<i64, Subscriber>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
    contexts: RwLock<HashMap<String, (Instant, BookingContext)>>,
    hits: RwLock<HashMap<String, (Instant, u32)>>,
    context_ttl: Duration,
}

impl MemoryStore {
    pub fn new(context_ttl_seconds: u64) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            contexts: RwLock::new(HashMap::new()),
            hits: RwLock::new(HashMap::new()),
            context_ttl: Duration::from_secs(context_ttl_seconds),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(3600)
    }
}

#[async_trait]
impl FlightRepository for MemoryStore {
    async fn search(&self, query: &FlightSearchQuery) -> RepoResult<Vec<Flight>> {
        let tables = self.tables.read().await;
        let mut flights: Vec<Flight> = tables
            .flights
            .values()
            .filter(|f| query.matches(f))
            .cloned()
            .collect();
        flights.sort_by_key(|f| (f.depart_time, f.id));
        Ok(flights)
    }

    async fn get(&self, id: i64) -> RepoResult<Option<Flight>> {
        Ok(self.tables.read().await.flights.get(&id).cloned())
    }

    async fn list_departing_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepoResult<Vec<Flight>> {
        let tables = self.tables.read().await;
        let mut flights: Vec<Flight> = tables
            .flights
            .values()
            .filter(|f| f.depart_time >= start && f.depart_time < end)
            .cloned()
            .collect();
        flights.sort_by_key(|f| (f.depart_time, f.id));
        Ok(flights)
    }

    async fn create(&self, flight: &NewFlight) -> RepoResult<Flight> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let flight = Flight {
            id,
            origin: flight.origin.clone(),
            destination: flight.destination.clone(),
            depart_time: flight.depart_time,
            price_cents: flight.price_cents,
            aircraft_type_id: flight.aircraft_type_id,
            status: None,
            status_note: None,
        };
        tables.flights.insert(id, flight.clone());
        Ok(flight)
    }

    async fn update_status(&self, id: i64, status: &str, note: Option<&str>) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.flights.get_mut(&id) {
            Some(flight) => {
                flight.status = Some(status.to_string());
                flight.status_note = note.map(str::to_string);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn route_popularity(&self) -> RepoResult<Vec<RouteCount>> {
        let tables = self.tables.read().await;
        let mut counts: BTreeMap<(String, String), i64> = BTreeMap::new();
        for flight in tables.flights.values() {
            *counts
                .entry((flight.origin.clone(), flight.destination.clone()))
                .or_default() += 1;
        }
        let mut routes: Vec<RouteCount> = counts
            .into_iter()
            .map(|((origin, destination), count)| RouteCount { origin, destination, count })
            .collect();
        // stable sort keeps the alphabetical order among equal counts
        routes.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(routes)
    }
}

#[async_trait]
impl FleetRepository for MemoryStore {
    async fn create_aircraft_type(&self, aircraft: &AircraftType) -> RepoResult<AircraftType> {
        let mut tables = self.tables.write().await;
        if tables
            .aircraft_types
            .values()
            .any(|a| a.code.eq_ignore_ascii_case(&aircraft.code))
        {
            return Err(RepoError::Duplicate(format!("aircraft type {}", aircraft.code)));
        }
        let id = tables.next_id();
        let mut stored = aircraft.clone();
        stored.id = id;
        tables.aircraft_types.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_aircraft_type(&self, id: i64) -> RepoResult<Option<AircraftType>> {
        Ok(self.tables.read().await.aircraft_types.get(&id).cloned())
    }

    async fn list_seats(&self, flight_id: i64) -> RepoResult<Vec<Seat>> {
        let tables = self.tables.read().await;
        let mut seats: Vec<Seat> = tables
            .seats
            .values()
            .filter(|s| s.flight_id == flight_id)
            .cloned()
            .collect();
        seats.sort_by(|a, b| (a.row_num, &a.seat_letter).cmp(&(b.row_num, &b.seat_letter)));
        Ok(seats)
    }

    async fn create_seats(&self, flight_id: i64, seats: &[SeatSpec]) -> RepoResult<usize> {
        let mut tables = self.tables.write().await;
        let mut inserted = 0;
        for spec in seats {
            let letter = spec.letter.to_string();
            let exists = tables.seats.values().any(|s| {
                s.flight_id == flight_id && s.row_num == spec.row && s.seat_letter == letter
            });
            if exists {
                continue;
            }
            let id = tables.next_id();
            tables.seats.insert(
                id,
                Seat {
                    id,
                    flight_id,
                    row_num: spec.row,
                    seat_letter: letter,
                    cabin: spec.cabin,
                    is_blocked: false,
                },
            );
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn set_seat_blocked(
        &self,
        flight_id: i64,
        row: i32,
        letter: char,
        blocked: bool,
    ) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        let letter = letter.to_string();
        match tables
            .seats
            .values_mut()
            .find(|s| s.flight_id == flight_id && s.row_num == row && s.seat_letter == letter)
        {
            Some(seat) => {
                seat.is_blocked = blocked;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &NewUser) -> RepoResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Duplicate(format!("user {}", user.email)));
        }
        let id = tables.next_id();
        let stored = User {
            id,
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            is_staff: user.is_staff,
            created_at: Utc::now(),
        };
        tables.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn get(&self, id: i64) -> RepoResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> RepoResult<Option<User>> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.first_name = update.first_name.clone();
            user.last_name = update.last_name.clone();
            user.phone = update.phone.clone();
            user.clone()
        }))
    }
}

#[async_trait]
impl TravelerRepository for MemoryStore {
    async fn list(&self, user_id: i64) -> RepoResult<Vec<Traveler>> {
        let tables = self.tables.read().await;
        let mut travelers: Vec<Traveler> = tables
            .travelers
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        travelers.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(travelers)
    }

    async fn create(&self, user_id: i64, traveler: &NewTraveler) -> RepoResult<Traveler> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let stored = Traveler {
            id,
            user_id,
            full_name: traveler.full_name.clone(),
            date_of_birth: traveler.date_of_birth,
            passport_number: traveler.passport_number.clone(),
            nationality: traveler.nationality.clone(),
        };
        tables.travelers.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, user_id: i64, traveler_id: i64) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .travelers
            .get(&traveler_id)
            .is_some_and(|t| t.user_id == user_id);
        if owned {
            tables.travelers.remove(&traveler_id);
        }
        Ok(owned)
    }
}

#[async_trait]
impl ContactRepository for MemoryStore {
    async fn create(&self, message: &NewContactMessage) -> RepoResult<ContactMessage> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let stored = ContactMessage {
            id,
            name: message.name.clone(),
            phone: message.phone.clone(),
            email: message.email.clone(),
            message: message.message.clone(),
            received_at: Utc::now(),
        };
        tables.contact_messages.insert(id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl SubscriberRepository for MemoryStore {
    async fn upsert(&self, subscriber: &NewSubscriber) -> RepoResult<Subscriber> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables
            .subscribers
            .values_mut()
            .find(|s| s.email == subscriber.email)
        {
            existing.full_name = subscriber.full_name.clone();
            existing.phone = subscriber.phone.clone();
            existing.flight_id = subscriber.flight_id;
            return Ok(existing.clone());
        }

        let id = tables.next_id();
        let stored = Subscriber {
            id,
            full_name: subscriber.full_name.clone(),
            email: subscriber.email.clone(),
            phone: subscriber.phone.clone(),
            flight_id: subscriber.flight_id,
            created_at: Utc::now(),
        };
        tables.subscribers.insert(id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create(&self, booking: &NewBooking) -> RepoResult<Booking> {
        let mut tables = self.tables.write().await;
        if tables
            .bookings
            .values()
            .any(|b| b.booking_reference == booking.booking_reference)
        {
            return Err(RepoError::Duplicate(format!("booking {}", booking.booking_reference)));
        }
        let id = tables.next_id();
        let now = Utc::now();
        let stored = Booking {
            id,
            user_id: booking.user_id,
            flight_id: Some(booking.flight_id),
            airline: booking.airline.clone(),
            flight_number: booking.flight_number.clone(),
            origin: booking.origin.clone(),
            destination: booking.destination.clone(),
            departure_time: booking.departure_time,
            arrival_time: booking.arrival_time,
            ticket_class: booking.ticket_class,
            booking_reference: booking.booking_reference.clone(),
            status: BookingStatus::Upcoming,
            total_paid_cents: booking.total_paid_cents,
            cancellation_reason: None,
            cancellation_ack: false,
            canceled_at: None,
            extras: booking.extras.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.bookings.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_for_user(&self, user_id: i64) -> RepoResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.departure_time);
        Ok(bookings)
    }

    async fn get_for_user(&self, id: i64, user_id: i64) -> RepoResult<Option<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables.bookings.get(&id).filter(|b| b.user_id == user_id).cloned())
    }

    async fn find_by_reference(&self, booking_reference: &str) -> RepoResult<Option<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .values()
            .find(|b| b.booking_reference == booking_reference)
            .cloned())
    }

    async fn list_for_flight(&self, flight_id: i64) -> RepoResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .values()
            .filter(|b| b.flight_id == Some(flight_id))
            .cloned()
            .collect())
    }

    async fn update(&self, booking: &Booking) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(stored) = tables.bookings.get_mut(&booking.id) {
            *stored = booking.clone();
        }
        Ok(())
    }
}

#[async_trait]
impl BookingRecordRepository for MemoryStore {
    async fn create_customer(&self, customer: &NewCustomer) -> RepoResult<Customer> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let stored = Customer {
            id,
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
        };
        tables.customers.insert(id, stored.clone());
        Ok(stored)
    }

    async fn create(&self, record: &NewBookingRecord) -> RepoResult<BookingRecord> {
        let mut tables = self.tables.write().await;
        if tables.records.values().any(|r| r.booking_ref == record.booking_ref) {
            return Err(RepoError::Duplicate(format!("booking record {}", record.booking_ref)));
        }
        let id = tables.next_id();
        let now = Utc::now();
        let stored = BookingRecord {
            id,
            booking_ref: record.booking_ref.clone(),
            flight_id: record.flight_id,
            customer_id: record.customer_id,
            owner: record.owner.clone(),
            total_paid_cents: record.total_paid_cents,
            status: record.status.clone(),
            passengers: record.passengers.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.records.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_ref(&self, booking_ref: &str) -> RepoResult<Option<BookingRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .records
            .values()
            .find(|r| r.booking_ref == booking_ref)
            .cloned())
    }

    async fn list_for_owner(&self, owner: &str) -> RepoResult<Vec<BookingRecord>> {
        let tables = self.tables.read().await;
        // ids grow with insertion, so reverse id order is newest first
        Ok(tables
            .records
            .values()
            .rev()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect())
    }

    async fn list_for_flight(&self, flight_id: i64) -> RepoResult<Vec<BookingRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .records
            .values()
            .filter(|r| r.flight_id == flight_id)
            .cloned()
            .collect())
    }

    async fn update(&self, record: &BookingRecord) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(stored) = tables.records.get_mut(&record.id) {
            stored.status = record.status.clone();
            stored.passengers = record.passengers.clone();
            stored.updated_at = record.updated_at;
        }
        Ok(())
    }

    async fn lookup(&self, lookup: &CustomerLookup) -> RepoResult<Vec<(BookingRecord, Customer)>> {
        let lookup = lookup.normalized();
        let tables = self.tables.read().await;
        Ok(tables
            .records
            .values()
            .rev()
            .filter_map(|record| {
                let customer = tables.customers.get(&record.customer_id?)?;
                lookup
                    .matches(record, customer)
                    .then(|| (record.clone(), customer.clone()))
            })
            .take(CustomerLookup::MAX_ROWS)
            .collect())
    }

    async fn customer(&self, id: i64) -> RepoResult<Option<Customer>> {
        Ok(self.tables.read().await.customers.get(&id).cloned())
    }
}

#[async_trait]
impl BookingContextStore for MemoryStore {
    async fn load(&self, session_id: &str) -> RepoResult<Option<BookingContext>> {
        let contexts = self.contexts.read().await;
        Ok(contexts
            .get(session_id)
            .filter(|(saved_at, _)| saved_at.elapsed() < self.context_ttl)
            .map(|(_, ctx)| ctx.clone()))
    }

    async fn save(&self, session_id: &str, context: &BookingContext) -> RepoResult<()> {
        let mut contexts = self.contexts.write().await;
        contexts.retain(|_, (saved_at, _)| saved_at.elapsed() < self.context_ttl);
        contexts.insert(session_id.to_string(), (Instant::now(), context.clone()));
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> RepoResult<()> {
        self.contexts.write().await.remove(session_id);
        Ok(())
    }
}

#[async_trait]
impl RateLimiter for MemoryStore {
    async fn check(&self, key: &str, limit: u32, window_secs: u64) -> RepoResult<bool> {
        let mut hits = self.hits.write().await;
        let window = Duration::from_secs(window_secs);
        hits.retain(|_, (started, _)| started.elapsed() < window);
        let entry = hits.entry(key.to_string()).or_insert((Instant::now(), 0));
        if entry.0.elapsed() >= window {
            *entry = (Instant::now(), 0);
        }
        entry.1 += 1;
        Ok(entry.1 <= limit)
    }
}
