//! Per-session state of the booking funnel.
//!
//! Every step reads the context, applies its change and writes it back. Steps
//! tolerate missing earlier data by substituting defaults (one passenger,
//! Economy, no bags), so a client can jump straight to any page. The only
//! hard check happens at seat assignment: codes that are not real, free seats
//! of the selected flight are stored as unset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skywings_catalog::{CabinClass, FarePassenger, FareRequest, PriceBreakdown, SeatMap};

use crate::search::FlightSearchParams;
use crate::CoreError;

pub const MAX_PASSENGERS: u32 = 9;
pub const MAX_EXTRA_BAGS: u32 = 10;
pub const DEFAULT_MEAL: &str = "Standard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStage {
    Search,
    SeatSelect,
    PassengerCapture,
    Payment,
    Finalized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadPassenger {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl LeadPassenger {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    fn normalized(mut self) -> Result<Self, CoreError> {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = self.email.trim().to_ascii_lowercase();
        self.phone = self
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        if self.first_name.is_empty() || self.last_name.is_empty() {
            return Err(CoreError::ValidationError(
                "Lead passenger first and last name are required".to_string(),
            ));
        }
        if !looks_like_email(&self.email) {
            return Err(CoreError::ValidationError(format!(
                "Invalid email address: {:?}",
                self.email
            )));
        }
        Ok(self)
    }
}

pub fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Preferences captured for one passenger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerPreference {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub cabin: CabinClass,
    #[serde(default)]
    pub seat_preference: Option<String>,
    #[serde(default = "default_meal")]
    pub meal: String,
    #[serde(default)]
    pub extra_bags: u32,
}

fn default_meal() -> String {
    DEFAULT_MEAL.to_string()
}

impl Default for PassengerPreference {
    fn default() -> Self {
        Self {
            full_name: None,
            cabin: CabinClass::Economy,
            seat_preference: None,
            meal: default_meal(),
            extra_bags: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingContext {
    pub stage: BookingStage,
    pub filters: Option<FlightSearchParams>,
    pub flight_id: Option<i64>,
    pub passenger_count: u32,
    /// One slot per passenger
    pub selected_seats: Vec<Option<String>>,
    pub lead_passenger: Option<LeadPassenger>,
    pub passengers: Vec<PassengerPreference>,
    pub billing_country: Option<String>,
    pub pricing: Option<PriceBreakdown>,
    pub updated_at: DateTime<Utc>,
}

impl Default for BookingContext {
    fn default() -> Self {
        Self {
            stage: BookingStage::Search,
            filters: None,
            flight_id: None,
            passenger_count: 1,
            selected_seats: Vec::new(),
            lead_passenger: None,
            passengers: Vec::new(),
            billing_country: None,
            pricing: None,
            updated_at: Utc::now(),
        }
    }
}

impl BookingContext {
    pub fn record_search(&mut self, filters: FlightSearchParams) {
        if let Some(count) = filters.passengers {
            self.passenger_count = clamp_passengers(Some(count));
        }
        self.filters = Some(filters);
        self.stage = BookingStage::Search;
        self.touch();
    }

    /// Picks the flight. Switching to a different flight drops seats and
    /// pricing of the old one.
    pub fn select_flight(&mut self, flight_id: i64, passenger_count: Option<u32>) {
        if self.flight_id != Some(flight_id) {
            self.selected_seats.clear();
            self.pricing = None;
        }
        self.flight_id = Some(flight_id);

        let count = match passenger_count {
            Some(count) => clamp_passengers(Some(count)),
            None => self
                .filters
                .as_ref()
                .and_then(|f| f.passengers)
                .map(|c| clamp_passengers(Some(c)))
                .unwrap_or(self.passenger_count.max(1)),
        };
        self.passenger_count = count;
        self.selected_seats.resize(count as usize, None);
        self.passengers.truncate(count as usize);
        self.stage = BookingStage::SeatSelect;
        self.touch();
    }

    /// Stores the submitted seats, one per passenger. Returns the codes that
    /// were not accepted.
    pub fn assign_seats(&mut self, codes: &[Option<String>], seat_map: &SeatMap) -> Vec<String> {
        let slots = self.passenger_count as usize;
        let submitted: Vec<Option<String>> = codes.iter().take(slots).cloned().collect();

        let selection = seat_map.validate_selection(&submitted);
        let mut seats = selection.seats;
        seats.resize(slots, None);

        self.selected_seats = seats;
        self.pricing = None;
        self.stage = BookingStage::PassengerCapture;
        self.touch();
        selection.rejected
    }

    pub fn capture_passengers(
        &mut self,
        lead: LeadPassenger,
        passengers: Vec<PassengerPreference>,
        billing_country: Option<String>,
    ) -> Result<(), CoreError> {
        let lead = lead.normalized()?;
        if let Some(p) = passengers.iter().find(|p| p.extra_bags > MAX_EXTRA_BAGS) {
            return Err(CoreError::ValidationError(format!(
                "At most {} extra bags per passenger, got {}",
                MAX_EXTRA_BAGS, p.extra_bags
            )));
        }

        let mut passengers: Vec<PassengerPreference> = passengers
            .into_iter()
            .take(self.passenger_count as usize)
            .map(|mut p| {
                p.full_name = p.full_name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
                if p.meal.trim().is_empty() {
                    p.meal = default_meal();
                }
                p
            })
            .collect();
        passengers.resize(self.passenger_count as usize, PassengerPreference::default());
        if passengers[0].full_name.is_none() {
            passengers[0].full_name = Some(lead.full_name());
        }

        self.lead_passenger = Some(lead);
        self.passengers = passengers;
        if let Some(country) = billing_country.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()) {
            self.billing_country = Some(country);
        }
        self.pricing = None;
        self.stage = BookingStage::Payment;
        self.touch();
        Ok(())
    }

    /// Captured preferences padded with defaults up to the passenger count.
    pub fn passengers_or_default(&self) -> Vec<PassengerPreference> {
        let mut passengers = self.passengers.clone();
        passengers.truncate(self.passenger_count.max(1) as usize);
        passengers.resize(self.passenger_count.max(1) as usize, PassengerPreference::default());
        passengers
    }

    pub fn seat_for(&self, index: usize) -> Option<String> {
        self.selected_seats.get(index).cloned().flatten()
    }

    pub fn fare_request(&self, base_fare_cents: i64, country_override: Option<&str>) -> FareRequest {
        let country = country_override
            .map(str::to_string)
            .or_else(|| self.billing_country.clone());
        FareRequest {
            base_fare_cents,
            passengers: self
                .passengers_or_default()
                .iter()
                .map(|p| FarePassenger { cabin: p.cabin, extra_bags: p.extra_bags })
                .collect(),
            country,
        }
    }

    pub fn apply_quote(&mut self, breakdown: PriceBreakdown) {
        self.pricing = Some(breakdown);
        self.touch();
    }

    pub fn finalize(&mut self) {
        self.stage = BookingStage::Finalized;
        self.touch();
    }

    pub fn is_finalized(&self) -> bool {
        self.stage == BookingStage::Finalized
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn clamp_passengers(count: Option<u32>) -> u32 {
    count.unwrap_or(1).clamp(1, MAX_PASSENGERS)
}
