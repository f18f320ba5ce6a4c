//! Read models for the "My Bookings" and "Trips" pages.

use chrono::{DateTime, Utc};
use serde::Serialize;
use skywings_core::flight::AIRLINE_NAME;
use skywings_core::Flight;

use crate::models::{Booking, BookingRecord, BookingStatus};

pub const CANCELLATION_POLICY: &str = "By canceling this booking, you may incur a cancellation fee based on your fare type. Refunds (if any) will be processed in 5-10 business days.";
pub const FARE_TERMS: &str = "Free online cancellation up to 2 hours before departure.";
pub const INCLUDED_BAGS_PER_PASSENGER: u32 = 1;

#[derive(Debug, Serialize)]
pub struct MyBookings {
    pub upcoming: Vec<Booking>,
    pub past: Vec<Booking>,
    pub canceled: Vec<Booking>,
    pub policy_text: &'static str,
    /// The most recent booking (by departure, then last update) is canceled
    pub show_cancel_banner: bool,
}

impl MyBookings {
    pub fn build(mut bookings: Vec<Booking>, now: DateTime<Utc>) -> Self {
        bookings.sort_by_key(|b| b.departure_time);

        let show_cancel_banner = bookings
            .iter()
            .max_by_key(|b| (b.departure_time, b.updated_at))
            .is_some_and(|b| b.status == BookingStatus::Canceled);

        let mut upcoming = Vec::new();
        let mut past = Vec::new();
        let mut canceled = Vec::new();
        for booking in bookings {
            if booking.status == BookingStatus::Canceled {
                canceled.push(booking);
            } else if booking.status == BookingStatus::Completed || booking.departure_time < now {
                past.push(booking);
            } else {
                upcoming.push(booking);
            }
        }

        Self {
            upcoming,
            past,
            canceled,
            policy_text: CANCELLATION_POLICY,
            show_cancel_banner,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaxView {
    pub label: String,
    /// Short badge: the label, or `P{n}` for generic "Passenger n" labels
    pub chip: String,
    pub name: String,
    pub class: String,
    pub seat_pref: String,
    pub meal: String,
    pub extra_bags: u32,
    pub seat: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BaggageSummary {
    pub total: u32,
    pub included: u32,
    pub extras: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TripView {
    pub origin: String,
    pub destination: String,
    pub airline: &'static str,
    pub flight_number: String,
    pub departure: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
    pub booking_ref: String,
    pub ticket_type: String,
    pub total_paid_cents: i64,
    pub formatted_total: String,
    pub price_cents: i64,
    pub status: String,
    pub pax: Vec<PaxView>,
    pub baggage: BaggageSummary,
    pub fare_terms: &'static str,
    pub available: bool,
}

impl TripView {
    /// `status` is the already derived display status of the record.
    pub fn build(record: &BookingRecord, flight: &Flight, status: String, now: DateTime<Utc>) -> Self {
        let pax: Vec<PaxView> = record
            .passengers
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                let label = if p.label.trim().is_empty() {
                    format!("P{}", idx + 1)
                } else {
                    p.label.clone()
                };
                let chip = if label.to_ascii_lowercase().starts_with("passenger") {
                    format!("P{}", idx + 1)
                } else {
                    label.clone()
                };
                PaxView {
                    chip,
                    name: if p.full_name.trim().is_empty() {
                        format!("Passenger {}", idx + 1)
                    } else {
                        p.full_name.clone()
                    },
                    label,
                    class: p.cabin.to_string(),
                    seat_pref: p.seat_preference.clone().unwrap_or_default(),
                    meal: p.meal.clone(),
                    extra_bags: p.extra_bags,
                    seat: p.seat_code.clone().unwrap_or_default(),
                }
            })
            .collect();

        let extras = pax.iter().fold(0u32, |acc, p| acc.saturating_add(p.extra_bags));
        let included = (pax.len() as u32).saturating_mul(INCLUDED_BAGS_PER_PASSENGER);

        Self {
            origin: flight.origin.clone(),
            destination: flight.destination.clone(),
            airline: AIRLINE_NAME,
            flight_number: flight.flight_number(),
            departure: flight.depart_time,
            arrival: flight.arrival_time(),
            booking_ref: record.booking_ref.clone(),
            ticket_type: pax
                .first()
                .map(|p| p.class.clone())
                .unwrap_or_else(|| "Economy".to_string()),
            total_paid_cents: record.total_paid_cents,
            formatted_total: skywings_shared::format_cents(record.total_paid_cents),
            price_cents: flight.price_cents,
            status,
            pax,
            baggage: BaggageSummary {
                total: included.saturating_add(extras),
                included,
                extras,
            },
            fare_terms: FARE_TERMS,
            available: flight.is_available(now),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct TripGroups {
    pub upcoming: Vec<TripView>,
    pub past: Vec<TripView>,
    pub cancelled: Vec<TripView>,
}

pub fn group_trips(trips: Vec<TripView>, now: DateTime<Utc>) -> TripGroups {
    let mut groups = TripGroups::default();
    for trip in trips {
        let status = trip.status.to_ascii_lowercase();
        if status.contains("cancel") {
            groups.cancelled.push(trip);
        } else if trip.departure <= now || status.contains("depart") {
            groups.past.push(trip);
        } else {
            groups.upcoming.push(trip);
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PassengerEntry;
    use chrono::Duration;
    use skywings_catalog::CabinClass;

    fn booking(id: i64, departs_in: Duration, status: BookingStatus, now: DateTime<Utc>) -> Booking {
        Booking {
            id,
            user_id: 1,
            flight_id: Some(id),
            airline: "SkyWings".to_string(),
            flight_number: format!("SW{:04}", id),
            origin: "YYZ".to_string(),
            destination: "LHR".to_string(),
            departure_time: now + departs_in,
            arrival_time: now + departs_in + Duration::hours(3),
            ticket_class: CabinClass::Economy,
            booking_reference: format!("SW{:04}000000", id),
            status,
            total_paid_cents: 10000,
            cancellation_reason: None,
            cancellation_ack: false,
            canceled_at: None,
            extras: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_my_bookings_grouping() {
        let now = Utc::now();
        let grouped = MyBookings::build(
            vec![
                booking(1, Duration::days(5), BookingStatus::Upcoming, now),
                booking(2, Duration::days(-5), BookingStatus::Upcoming, now),
                booking(3, Duration::days(1), BookingStatus::Completed, now),
                booking(4, Duration::days(2), BookingStatus::Canceled, now),
            ],
            now,
        );
        assert_eq!(grouped.upcoming.iter().map(|b| b.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(grouped.past.iter().map(|b| b.id).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(grouped.canceled.len(), 1);
        // latest departure (id 1) is not canceled
        assert!(!grouped.show_cancel_banner);
    }

    #[test]
    fn test_cancel_banner_follows_latest_booking() {
        let now = Utc::now();
        let grouped = MyBookings::build(
            vec![
                booking(1, Duration::days(1), BookingStatus::Upcoming, now),
                booking(2, Duration::days(9), BookingStatus::Canceled, now),
            ],
            now,
        );
        assert!(grouped.show_cancel_banner);
        assert!(!MyBookings::build(vec![], now).show_cancel_banner);
    }

    #[test]
    fn test_trip_view_baggage_and_chips() {
        let now = Utc::now();
        let flight = Flight {
            id: 7,
            origin: "YYZ".to_string(),
            destination: "DXB".to_string(),
            depart_time: now + Duration::days(3),
            price_cents: 150000,
            aircraft_type_id: None,
            status: None,
            status_note: None,
        };
        let entry = |label: &str, cabin, bags| PassengerEntry {
            label: label.to_string(),
            full_name: "Yara Haddad".to_string(),
            cabin,
            seat_preference: Some("Window".to_string()),
            meal: "Vegetarian".to_string(),
            extra_bags: bags,
            seat_code: None,
            notes: vec![],
        };
        let record = BookingRecord {
            id: 1,
            booking_ref: "SW0007123456".to_string(),
            flight_id: 7,
            customer_id: None,
            owner: "s".to_string(),
            total_paid_cents: 367212,
            status: None,
            passengers: vec![
                entry("Passenger 1", CabinClass::First, 0),
                entry("P2", CabinClass::Business, 1),
            ],
            created_at: now,
            updated_at: now,
        };

        let trip = TripView::build(&record, &flight, "On time".to_string(), now);
        assert_eq!(trip.pax[0].chip, "P1");
        assert_eq!(trip.pax[1].chip, "P2");
        assert_eq!(trip.ticket_type, "First");
        assert_eq!(trip.baggage, BaggageSummary { total: 3, included: 2, extras: 1 });
        assert_eq!(trip.flight_number, "SW0007");
        assert!(trip.available);
        assert_eq!(trip.formatted_total, "$3,672.12");

        let groups = group_trips(vec![trip], now);
        assert_eq!(groups.upcoming.len(), 1);
    }
}
