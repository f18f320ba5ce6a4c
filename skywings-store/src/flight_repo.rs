use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skywings_catalog::{AircraftType, CabinClass, ClassBand, Seat, SeatSpec};
use skywings_core::repository::{FleetRepository, FlightRepository};
use skywings_core::search::FlightSearchQuery;
use skywings_core::{Flight, NewFlight, RepoResult, RouteCount};
use sqlx::types::Json;

use crate::database::db_err;

const FLIGHT_COLUMNS: &str =
    "id, origin, destination, depart_time, price_cents, aircraft_type_id, status, status_note";

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: i64,
    origin: String,
    destination: String,
    depart_time: DateTime<Utc>,
    price_cents: i64,
    aircraft_type_id: Option<i64>,
    status: Option<String>,
    status_note: Option<String>,
}

impl From<FlightRow> for Flight {
    fn from(row: FlightRow) -> Self {
        Flight {
            id: row.id,
            origin: row.origin,
            destination: row.destination,
            depart_time: row.depart_time,
            price_cents: row.price_cents,
            aircraft_type_id: row.aircraft_type_id,
            status: row.status,
            status_note: row.status_note,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AircraftTypeRow {
    id: i64,
    code: String,
    name: String,
    total_rows: i32,
    layout: String,
    class_map: Json<Vec<ClassBand>>,
}

impl From<AircraftTypeRow> for AircraftType {
    fn from(row: AircraftTypeRow) -> Self {
        AircraftType {
            id: row.id,
            code: row.code,
            name: row.name,
            total_rows: row.total_rows,
            layout: row.layout,
            class_map: row.class_map.0,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    id: i64,
    flight_id: i64,
    row_num: i32,
    seat_letter: String,
    cabin: String,
    is_blocked: bool,
}

impl From<SeatRow> for Seat {
    fn from(row: SeatRow) -> Self {
        Seat {
            id: row.id,
            flight_id: row.flight_id,
            row_num: row.row_num,
            seat_letter: row.seat_letter,
            cabin: CabinClass::parse_lenient(&row.cabin),
            is_blocked: row.is_blocked,
        }
    }
}

pub struct PostgresFlightRepository {
    pub pool: sqlx::PgPool,
}

impl PostgresFlightRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FlightRepository for PostgresFlightRepository {
    async fn search(&self, query: &FlightSearchQuery) -> RepoResult<Vec<Flight>> {
        let (start, end) = match query.day_window() {
            Some((start, end)) => (Some(start), Some(end)),
            None => (None, None),
        };

        let sql = format!(
            "SELECT {FLIGHT_COLUMNS} FROM flights
             WHERE ($1::text IS NULL OR origin = $1)
               AND ($2::text IS NULL OR destination = $2)
               AND ($3::timestamptz IS NULL OR (depart_time >= $3 AND depart_time < $4))
             ORDER BY depart_time ASC"
        );
        let rows = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(query.origin.as_deref())
            .bind(query.destination.as_deref())
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(rows.into_iter().map(Flight::from).collect())
    }

    async fn get(&self, id: i64) -> RepoResult<Option<Flight>> {
        let sql = format!("SELECT {FLIGHT_COLUMNS} FROM flights WHERE id = $1");
        let row = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Flight::from))
    }

    async fn list_departing_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepoResult<Vec<Flight>> {
        let sql = format!(
            "SELECT {FLIGHT_COLUMNS} FROM flights
             WHERE depart_time >= $1 AND depart_time < $2
             ORDER BY depart_time ASC"
        );
        let rows = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Flight::from).collect())
    }

    async fn create(&self, flight: &NewFlight) -> RepoResult<Flight> {
        let sql = format!(
            "INSERT INTO flights (origin, destination, depart_time, price_cents, aircraft_type_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {FLIGHT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(&flight.origin)
            .bind(&flight.destination)
            .bind(flight.depart_time)
            .bind(flight.price_cents)
            .bind(flight.aircraft_type_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.into())
    }

    async fn update_status(&self, id: i64, status: &str, note: Option<&str>) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE flights SET status = $2, status_note = $3 WHERE id = $1")
            .bind(id)
            .bind(status)
            .bind(note)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn route_popularity(&self) -> RepoResult<Vec<RouteCount>> {
        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            "SELECT origin, destination, COUNT(*) AS count
             FROM flights
             GROUP BY origin, destination
             ORDER BY count DESC, origin ASC, destination ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(origin, destination, count)| RouteCount { origin, destination, count })
            .collect())
    }
}

pub struct PostgresFleetRepository {
    pub pool: sqlx::PgPool,
}

impl PostgresFleetRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FleetRepository for PostgresFleetRepository {
    async fn create_aircraft_type(&self, aircraft: &AircraftType) -> RepoResult<AircraftType> {
        let row = sqlx::query_as::<_, AircraftTypeRow>(
            "INSERT INTO aircraft_types (code, name, total_rows, layout, class_map)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, code, name, total_rows, layout, class_map",
        )
        .bind(&aircraft.code)
        .bind(&aircraft.name)
        .bind(aircraft.total_rows)
        .bind(&aircraft.layout)
        .bind(Json(&aircraft.class_map))
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.into())
    }

    async fn get_aircraft_type(&self, id: i64) -> RepoResult<Option<AircraftType>> {
        let row = sqlx::query_as::<_, AircraftTypeRow>(
            "SELECT id, code, name, total_rows, layout, class_map FROM aircraft_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(AircraftType::from))
    }

    async fn list_seats(&self, flight_id: i64) -> RepoResult<Vec<Seat>> {
        let rows = sqlx::query_as::<_, SeatRow>(
            "SELECT id, flight_id, row_num, seat_letter, cabin, is_blocked
             FROM seats WHERE flight_id = $1
             ORDER BY row_num, seat_letter",
        )
        .bind(flight_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(Seat::from).collect())
    }

    async fn create_seats(&self, flight_id: i64, seats: &[SeatSpec]) -> RepoResult<usize> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut inserted = 0;
        for seat in seats {
            let result = sqlx::query(
                "INSERT INTO seats (flight_id, row_num, seat_letter, cabin)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (flight_id, row_num, seat_letter) DO NOTHING",
            )
            .bind(flight_id)
            .bind(seat.row)
            .bind(seat.letter.to_string())
            .bind(seat.cabin.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
            inserted += result.rows_affected() as usize;
        }
        tx.commit().await.map_err(db_err)?;
        Ok(inserted)
    }

    async fn set_seat_blocked(
        &self,
        flight_id: i64,
        row: i32,
        letter: char,
        blocked: bool,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE seats SET is_blocked = $4
             WHERE flight_id = $1 AND row_num = $2 AND seat_letter = $3",
        )
        .bind(flight_id)
        .bind(row)
        .bind(letter.to_string())
        .bind(blocked)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}
