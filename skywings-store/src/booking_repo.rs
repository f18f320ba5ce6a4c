use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skywings_catalog::CabinClass;
use skywings_core::RepoResult;
use skywings_order::models::{
    Booking, BookingRecord, BookingStatus, Customer, CustomerLookup, NewBooking, NewBookingRecord,
    NewCustomer, PassengerEntry,
};
use skywings_order::repository::{BookingRecordRepository, BookingRepository};
use sqlx::types::Json;

use crate::database::db_err;

const BOOKING_COLUMNS: &str = "id, user_id, flight_id, airline, flight_number, origin, destination, \
    departure_time, arrival_time, ticket_class, booking_reference, status, total_paid_cents, \
    cancellation_reason, cancellation_ack, canceled_at, extras, created_at, updated_at";

const RECORD_COLUMNS: &str = "r.id, r.booking_ref, r.flight_id, r.customer_id, r.owner, \
    r.total_paid_cents, r.status, r.passengers, r.created_at, r.updated_at";

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i64,
    user_id: i64,
    flight_id: Option<i64>,
    airline: String,
    flight_number: String,
    origin: String,
    destination: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    ticket_class: String,
    booking_reference: String,
    status: String,
    total_paid_cents: i64,
    cancellation_reason: Option<String>,
    cancellation_ack: bool,
    canceled_at: Option<DateTime<Utc>>,
    extras: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            user_id: row.user_id,
            flight_id: row.flight_id,
            airline: row.airline,
            flight_number: row.flight_number,
            origin: row.origin,
            destination: row.destination,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            ticket_class: CabinClass::parse_lenient(&row.ticket_class),
            booking_reference: row.booking_reference,
            status: BookingStatus::parse(&row.status).unwrap_or(BookingStatus::Upcoming),
            total_paid_cents: row.total_paid_cents,
            cancellation_reason: row.cancellation_reason,
            cancellation_ack: row.cancellation_ack,
            canceled_at: row.canceled_at,
            extras: row.extras,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: i64,
    booking_ref: String,
    flight_id: i64,
    customer_id: Option<i64>,
    owner: String,
    total_paid_cents: i64,
    status: Option<String>,
    passengers: Json<Vec<PassengerEntry>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RecordRow> for BookingRecord {
    fn from(row: RecordRow) -> Self {
        BookingRecord {
            id: row.id,
            booking_ref: row.booking_ref,
            flight_id: row.flight_id,
            customer_id: row.customer_id,
            owner: row.owner,
            total_paid_cents: row.total_paid_cents,
            status: row.status,
            passengers: row.passengers.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LookupRow {
    #[sqlx(flatten)]
    record: RecordRow,
    c_id: i64,
    c_first_name: String,
    c_last_name: String,
    c_email: String,
    c_phone: Option<String>,
}

pub struct PostgresBookingRepository {
    pub pool: sqlx::PgPool,
}

impl PostgresBookingRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn create(&self, booking: &NewBooking) -> RepoResult<Booking> {
        let sql = format!(
            "INSERT INTO bookings (user_id, flight_id, airline, flight_number, origin, destination,
                departure_time, arrival_time, ticket_class, booking_reference, total_paid_cents, extras)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {BOOKING_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(booking.user_id)
            .bind(booking.flight_id)
            .bind(&booking.airline)
            .bind(&booking.flight_number)
            .bind(&booking.origin)
            .bind(&booking.destination)
            .bind(booking.departure_time)
            .bind(booking.arrival_time)
            .bind(booking.ticket_class.as_str())
            .bind(&booking.booking_reference)
            .bind(booking.total_paid_cents)
            .bind(&booking.extras)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.into())
    }

    async fn list_for_user(&self, user_id: i64) -> RepoResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY departure_time ASC"
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Booking::from).collect())
    }

    async fn get_for_user(&self, id: i64, user_id: i64) -> RepoResult<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 AND user_id = $2");
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Booking::from))
    }

    async fn find_by_reference(&self, booking_reference: &str) -> RepoResult<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_reference = $1");
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(booking_reference)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Booking::from))
    }

    async fn list_for_flight(&self, flight_id: i64) -> RepoResult<Vec<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE flight_id = $1");
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(flight_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Booking::from).collect())
    }

    async fn update(&self, booking: &Booking) -> RepoResult<()> {
        sqlx::query(
            "UPDATE bookings
             SET status = $2, cancellation_reason = $3, cancellation_ack = $4,
                 canceled_at = $5, extras = $6, updated_at = $7
             WHERE id = $1",
        )
        .bind(booking.id)
        .bind(booking.status.as_str())
        .bind(&booking.cancellation_reason)
        .bind(booking.cancellation_ack)
        .bind(booking.canceled_at)
        .bind(&booking.extras)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

pub struct PostgresBookingRecordRepository {
    pub pool: sqlx::PgPool,
}

impl PostgresBookingRecordRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRecordRepository for PostgresBookingRecordRepository {
    async fn create_customer(&self, customer: &NewCustomer) -> RepoResult<Customer> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "INSERT INTO customers (first_name, last_name, email, phone)
             VALUES ($1, $2, $3, $4)
             RETURNING id, first_name, last_name, email, phone",
        )
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.into())
    }

    async fn create(&self, record: &NewBookingRecord) -> RepoResult<BookingRecord> {
        let sql = format!(
            "INSERT INTO booking_records AS r
                (booking_ref, flight_id, customer_id, owner, total_paid_cents, status, passengers)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {RECORD_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(&record.booking_ref)
            .bind(record.flight_id)
            .bind(record.customer_id)
            .bind(&record.owner)
            .bind(record.total_paid_cents)
            .bind(&record.status)
            .bind(Json(&record.passengers))
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.into())
    }

    async fn find_by_ref(&self, booking_ref: &str) -> RepoResult<Option<BookingRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM booking_records r WHERE r.booking_ref = $1");
        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(booking_ref)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(BookingRecord::from))
    }

    async fn list_for_owner(&self, owner: &str) -> RepoResult<Vec<BookingRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM booking_records r
             WHERE r.owner = $1 ORDER BY r.created_at DESC"
        );
        let rows = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(BookingRecord::from).collect())
    }

    async fn list_for_flight(&self, flight_id: i64) -> RepoResult<Vec<BookingRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM booking_records r
             WHERE r.flight_id = $1 ORDER BY r.created_at ASC"
        );
        let rows = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(flight_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(BookingRecord::from).collect())
    }

    async fn update(&self, record: &BookingRecord) -> RepoResult<()> {
        sqlx::query(
            "UPDATE booking_records SET status = $2, passengers = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(record.id)
        .bind(&record.status)
        .bind(Json(&record.passengers))
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn lookup(&self, lookup: &CustomerLookup) -> RepoResult<Vec<(BookingRecord, Customer)>> {
        let lookup = lookup.normalized();
        let sql = format!(
            "SELECT {RECORD_COLUMNS},
                    c.id AS c_id, c.first_name AS c_first_name, c.last_name AS c_last_name,
                    c.email AS c_email, c.phone AS c_phone
             FROM booking_records r
             JOIN customers c ON c.id = r.customer_id
             WHERE ($1::text IS NULL OR c.first_name ILIKE '%' || $1 || '%' ESCAPE '\\')
               AND ($2::text IS NULL OR c.last_name ILIKE '%' || $2 || '%' ESCAPE '\\')
               AND ($3::text IS NULL OR c.email ILIKE '%' || $3 || '%' ESCAPE '\\')
               AND ($4::text IS NULL OR c.phone ILIKE '%' || $4 || '%' ESCAPE '\\')
               AND ($5::text IS NULL OR r.booking_ref ILIKE '%' || $5 || '%' ESCAPE '\\')
             ORDER BY r.created_at DESC
             LIMIT $6"
        );
        let rows = sqlx::query_as::<_, LookupRow>(&sql)
            .bind(lookup.first_name.as_deref().map(escape_like))
            .bind(lookup.last_name.as_deref().map(escape_like))
            .bind(lookup.email.as_deref().map(escape_like))
            .bind(lookup.phone.as_deref().map(escape_like))
            .bind(lookup.booking_ref.as_deref().map(escape_like))
            .bind(CustomerLookup::MAX_ROWS as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let customer = Customer {
                    id: row.c_id,
                    first_name: row.c_first_name,
                    last_name: row.c_last_name,
                    email: row.c_email,
                    phone: row.c_phone,
                };
                (row.record.into(), customer)
            })
            .collect())
    }

    async fn customer(&self, id: i64) -> RepoResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, first_name, last_name, email, phone FROM customers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(Customer::from))
    }
}

/// Makes `%`, `_` and `\` match literally inside an `ILIKE ... ESCAPE '\'` pattern.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
