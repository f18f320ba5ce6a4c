use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skywings_catalog::CabinClass;
use skywings_core::PassengerPreference;

/// Status of an account booking
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Upcoming,
    Completed,
    Canceled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Upcoming => "UPCOMING",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Canceled => "CANCELED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "UPCOMING" => Some(BookingStatus::Upcoming),
            "COMPLETED" => Some(BookingStatus::Completed),
            "CANCELED" | "CANCELLED" => Some(BookingStatus::Canceled),
            _ => None,
        }
    }
}

/// Booking owned by a registered customer. Keeps a snapshot of the flight as
/// it was when booked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub flight_id: Option<i64>,
    pub airline: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub ticket_class: CabinClass,
    pub booking_reference: String,
    pub status: BookingStatus,
    pub total_paid_cents: i64,
    pub cancellation_reason: Option<String>,
    pub cancellation_ack: bool,
    pub canceled_at: Option<DateTime<Utc>>,
    /// Passenger list and anything else captured at checkout
    pub extras: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn formatted_total(&self) -> String {
        skywings_shared::format_cents(self.total_paid_cents)
    }

    /// Upcoming and not yet departed.
    pub fn can_cancel(&self, now: DateTime<Utc>) -> bool {
        self.status == BookingStatus::Upcoming && self.departure_time > now
    }

    pub fn seat_codes(&self) -> Vec<String> {
        self.extras
            .get("passengers")
            .and_then(|p| serde_json::from_value::<Vec<PassengerEntry>>(p.clone()).ok())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.seat_code)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub user_id: i64,
    pub flight_id: i64,
    pub airline: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub ticket_class: CabinClass,
    pub booking_reference: String,
    pub total_paid_cents: i64,
    pub extras: serde_json::Value,
}

/// One passenger of a guest booking record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerEntry {
    pub label: String,
    pub full_name: String,
    pub cabin: CabinClass,
    #[serde(default)]
    pub seat_preference: Option<String>,
    pub meal: String,
    #[serde(default)]
    pub extra_bags: u32,
    #[serde(default)]
    pub seat_code: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl PassengerEntry {
    pub fn from_preference(index: usize, pref: &PassengerPreference, seat_code: Option<String>) -> Self {
        let label = format!("P{}", index + 1);
        Self {
            full_name: pref
                .full_name
                .clone()
                .unwrap_or_else(|| format!("Passenger {}", index + 1)),
            label,
            cabin: pref.cabin,
            seat_preference: pref.seat_preference.clone(),
            meal: pref.meal.clone(),
            extra_bags: pref.extra_bags,
            seat_code,
            notes: Vec::new(),
        }
    }
}

/// Booking made through the session funnel, owned by the session subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: i64,
    pub booking_ref: String,
    pub flight_id: i64,
    pub customer_id: Option<i64>,
    pub owner: String,
    pub total_paid_cents: i64,
    /// Free-form display status, e.g. "On time", "Cancelled", "Departed"
    pub status: Option<String>,
    pub passengers: Vec<PassengerEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingRecord {
    pub fn is_canceled(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.to_ascii_lowercase().contains("cancel"))
    }

    pub fn seat_codes(&self) -> impl Iterator<Item = &str> {
        self.passengers.iter().filter_map(|p| p.seat_code.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBookingRecord {
    pub booking_ref: String,
    pub flight_id: i64,
    pub customer_id: Option<i64>,
    pub owner: String,
    pub total_paid_cents: i64,
    pub status: Option<String>,
    pub passengers: Vec<PassengerEntry>,
}

/// Primary contact of a booking record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Staff customer lookup. Each given field is a case-insensitive substring
/// match; empty fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerLookup {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub booking_ref: Option<String>,
}

impl CustomerLookup {
    pub const MAX_ROWS: usize = 100;

    pub fn normalized(&self) -> Self {
        fn clean(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase)
        }
        Self {
            first_name: clean(&self.first_name),
            last_name: clean(&self.last_name),
            email: clean(&self.email),
            phone: clean(&self.phone),
            booking_ref: clean(&self.booking_ref),
        }
    }

    pub fn is_empty(&self) -> bool {
        let n = self.normalized();
        n.first_name.is_none()
            && n.last_name.is_none()
            && n.email.is_none()
            && n.phone.is_none()
            && n.booking_ref.is_none()
    }

    /// Expects `self` to be normalized.
    pub fn matches(&self, record: &BookingRecord, customer: &Customer) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            needle
                .as_deref()
                .map_or(true, |n| haystack.to_lowercase().contains(n))
        }
        contains(&customer.first_name, &self.first_name)
            && contains(&customer.last_name, &self.last_name)
            && contains(&customer.email, &self.email)
            && contains(customer.phone.as_deref().unwrap_or(""), &self.phone)
            && contains(&record.booking_ref, &self.booking_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(status: Option<&str>) -> BookingRecord {
        BookingRecord {
            id: 1,
            booking_ref: "SW0042123456".to_string(),
            flight_id: 42,
            customer_id: Some(1),
            owner: "session-1".to_string(),
            total_paid_cents: 22600,
            status: status.map(str::to_string),
            passengers: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(BookingStatus::parse("cancelled"), Some(BookingStatus::Canceled));
        assert_eq!(BookingStatus::parse("UPCOMING"), Some(BookingStatus::Upcoming));
        assert_eq!(BookingStatus::parse("later"), None);
        assert_eq!(
            serde_json::to_value(BookingStatus::Completed).unwrap(),
            json!("COMPLETED")
        );
    }

    #[test]
    fn test_record_cancel_flag() {
        assert!(record(Some("Cancelled")).is_canceled());
        assert!(!record(Some("On time")).is_canceled());
        assert!(!record(None).is_canceled());
    }

    #[test]
    fn test_customer_lookup() {
        let customer = Customer {
            id: 1,
            first_name: "Maya".to_string(),
            last_name: "Singh".to_string(),
            email: "maya@example.com".to_string(),
            phone: Some("416-555-0199".to_string()),
        };
        let rec = record(None);

        let lookup = CustomerLookup {
            last_name: Some(" SIN ".to_string()),
            booking_ref: Some("0042".to_string()),
            ..Default::default()
        };
        assert!(!lookup.is_empty());
        assert!(lookup.normalized().matches(&rec, &customer));

        let miss = CustomerLookup {
            email: Some("other@".to_string()),
            ..Default::default()
        };
        assert!(!miss.normalized().matches(&rec, &customer));
        assert!(CustomerLookup::default().is_empty());
    }

    #[test]
    fn test_passenger_entry_defaults() {
        let entry = PassengerEntry::from_preference(1, &PassengerPreference::default(), None);
        assert_eq!(entry.label, "P2");
        assert_eq!(entry.full_name, "Passenger 2");
        assert_eq!(entry.meal, "Standard");
    }
}
