use std::collections::BTreeSet;

use skywings_catalog::SeatMap;
use skywings_core::{FleetRepository, RepoResult};

use crate::models::{Booking, BookingRecord, BookingStatus};
use crate::repository::{BookingRecordRepository, BookingRepository};

/// Seat codes held by live (not canceled) records and bookings of a flight.
pub fn occupied_seat_codes(records: &[BookingRecord], bookings: &[Booking]) -> Vec<String> {
    let mut codes = BTreeSet::new();
    for record in records.iter().filter(|r| !r.is_canceled()) {
        codes.extend(record.seat_codes().map(|c| c.to_ascii_uppercase()));
    }
    for booking in bookings.iter().filter(|b| b.status != BookingStatus::Canceled) {
        codes.extend(booking.seat_codes().into_iter().map(|c| c.to_ascii_uppercase()));
    }
    codes.into_iter().collect()
}

pub async fn load_seat_map(
    flight_id: i64,
    fleet: &dyn FleetRepository,
    records: &dyn BookingRecordRepository,
    bookings: &dyn BookingRepository,
) -> RepoResult<SeatMap> {
    let seats = fleet.list_seats(flight_id).await?;
    let held_records = records.list_for_flight(flight_id).await?;
    let held_bookings = bookings.list_for_flight(flight_id).await?;
    let occupied = occupied_seat_codes(&held_records, &held_bookings);
    Ok(SeatMap::new(&seats, occupied))
}
