use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::fleet::CabinClass;

/// One passenger as seen by the fare calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarePassenger {
    pub cabin: CabinClass,
    pub extra_bags: u32,
}

impl FarePassenger {
    pub fn economy() -> Self {
        Self { cabin: CabinClass::Economy, extra_bags: 0 }
    }
}

/// Input to a quote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareRequest {
    /// Per-passenger base fare of the flight
    pub base_fare_cents: i64,
    pub passengers: Vec<FarePassenger>,
    /// Billing country, ISO code or name
    pub country: Option<String>,
}

/// Itemized result of a quote, stored in the booking context and echoed back
/// to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub base_fare_cents: i64,
    pub passenger_count: u32,
    pub fare_total_cents: i64,
    pub upgrade_cents: i64,
    pub extra_bags: u32,
    pub bag_fees_cents: i64,
    pub subtotal_cents: i64,
    pub tax_rate_bps: u32,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Fee per extra checked bag
    pub bag_fee_cents: i64,

    /// Flat per-passenger surcharge keyed by cabin name. Cabins not listed
    /// cost nothing extra.
    #[serde(default)]
    pub class_surcharges_cents: HashMap<String, i64>,

    /// Rate used when the billing country is missing or not in the table
    pub default_tax_rate_bps: u32,

    /// Tax rates in basis points keyed by ISO code or country name
    #[serde(default)]
    pub tax_rates_bps: HashMap<String, u32>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            bag_fee_cents: 5000,
            class_surcharges_cents: {
                let mut m = HashMap::new();
                m.insert("Business".to_string(), 45000);
                m.insert("First".to_string(), 90000);
                m
            },
            default_tax_rate_bps: 1000,
            tax_rates_bps: {
                let mut m = HashMap::new();
                m.insert("CA".to_string(), 1300);
                m.insert("CANADA".to_string(), 1300);
                m.insert("US".to_string(), 700);
                m.insert("UNITED STATES".to_string(), 700);
                m.insert("GB".to_string(), 2000);
                m.insert("UNITED KINGDOM".to_string(), 2000);
                m.insert("AE".to_string(), 500);
                m.insert("UNITED ARAB EMIRATES".to_string(), 500);
                m
            },
        }
    }
}

/// Fare calculator. Holds no state beyond its configuration; the same
/// request always yields the same breakdown.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    bag_fee_cents: i64,
    surcharges: HashMap<CabinClass, i64>,
    default_tax_rate_bps: u32,
    tax_rates: HashMap<String, u32>,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        let surcharges = config
            .class_surcharges_cents
            .iter()
            .map(|(name, cents)| (CabinClass::parse_lenient(name), *cents))
            .collect();
        let tax_rates = config
            .tax_rates_bps
            .into_iter()
            .map(|(country, bps)| (normalize_country(&country), bps))
            .collect();

        Self {
            bag_fee_cents: config.bag_fee_cents,
            surcharges,
            default_tax_rate_bps: config.default_tax_rate_bps,
            tax_rates,
        }
    }

    pub fn class_upgrade(&self, cabin: CabinClass) -> i64 {
        self.surcharges.get(&cabin).copied().unwrap_or(0)
    }

    pub fn bag_fee(&self) -> i64 {
        self.bag_fee_cents
    }

    /// Surcharge per cabin, for the seat map legend.
    pub fn upgrade_table(&self) -> Vec<(CabinClass, i64)> {
        CabinClass::ALL
            .iter()
            .map(|cabin| (*cabin, self.class_upgrade(*cabin)))
            .collect()
    }

    pub fn tax_rate_bps(&self, country: Option<&str>) -> u32 {
        country
            .map(normalize_country)
            .and_then(|key| self.tax_rates.get(&key).copied())
            .unwrap_or(self.default_tax_rate_bps)
    }

    /// `base × passengers + Σ upgrades + bags × fee + tax(subtotal)`
    pub fn quote(&self, request: &FareRequest) -> Result<PriceBreakdown, PricingError> {
        if request.base_fare_cents < 0 {
            return Err(PricingError::InvalidFare(request.base_fare_cents));
        }
        if request.passengers.is_empty() {
            return Err(PricingError::NoPassengers);
        }

        let passenger_count =
            u32::try_from(request.passengers.len()).map_err(|_| PricingError::Overflow)?;
        let fare_total_cents = request
            .base_fare_cents
            .checked_mul(i64::from(passenger_count))
            .ok_or(PricingError::Overflow)?;
        let upgrade_cents = request
            .passengers
            .iter()
            .try_fold(0i64, |acc, p| acc.checked_add(self.class_upgrade(p.cabin)))
            .ok_or(PricingError::Overflow)?;
        let extra_bags = request
            .passengers
            .iter()
            .try_fold(0u32, |acc, p| acc.checked_add(p.extra_bags))
            .ok_or(PricingError::Overflow)?;
        let bag_fees_cents = i64::from(extra_bags)
            .checked_mul(self.bag_fee_cents)
            .ok_or(PricingError::Overflow)?;

        let subtotal_cents = fare_total_cents
            .checked_add(upgrade_cents)
            .and_then(|s| s.checked_add(bag_fees_cents))
            .ok_or(PricingError::Overflow)?;
        let country = request
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        let tax_rate_bps = self.tax_rate_bps(country.as_deref());
        let tax_cents = apply_rate(subtotal_cents, tax_rate_bps).ok_or(PricingError::Overflow)?;
        let total_cents = subtotal_cents.checked_add(tax_cents).ok_or(PricingError::Overflow)?;

        Ok(PriceBreakdown {
            base_fare_cents: request.base_fare_cents,
            passenger_count,
            fare_total_cents,
            upgrade_cents,
            extra_bags,
            bag_fees_cents,
            subtotal_cents,
            tax_rate_bps,
            tax_cents,
            total_cents,
            country,
        })
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}

fn normalize_country(country: &str) -> String {
    country.trim().to_ascii_uppercase()
}

/// Rounds half up to the nearest cent.
fn apply_rate(amount_cents: i64, rate_bps: u32) -> Option<i64> {
    amount_cents
        .checked_mul(i64::from(rate_bps))?
        .checked_add(5_000)
        .map(|scaled| scaled / 10_000)
}

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("Base fare cannot be negative: {0}")]
    InvalidFare(i64),

    #[error("At least one passenger is required")]
    NoPassengers,

    #[error("Fare total is out of range")]
    Overflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_economy_passenger() {
        let engine = PricingEngine::default();
        let quote = engine
            .quote(&FareRequest {
                base_fare_cents: 20000,
                passengers: vec![FarePassenger::economy()],
                country: Some("CA".to_string()),
            })
            .unwrap();

        assert_eq!(quote.subtotal_cents, 20000);
        assert_eq!(quote.tax_cents, 2600);
        assert_eq!(quote.total_cents, 22600);
    }

    #[test]
    fn test_business_upgrade_and_bag() {
        let engine = PricingEngine::default();
        let quote = engine
            .quote(&FareRequest {
                base_fare_cents: 22000,
                passengers: vec![
                    FarePassenger { cabin: CabinClass::Business, extra_bags: 1 },
                    FarePassenger::economy(),
                ],
                country: Some("canada".to_string()),
            })
            .unwrap();

        assert_eq!(quote.fare_total_cents, 44000);
        assert_eq!(quote.upgrade_cents, 45000);
        assert_eq!(quote.bag_fees_cents, 5000);
        assert_eq!(quote.subtotal_cents, 94000);
        assert_eq!(quote.tax_cents, 12220);
        assert_eq!(quote.total_cents, 106220);
    }

    #[test]
    fn test_unknown_country_uses_default_rate() {
        let engine = PricingEngine::default();
        assert_eq!(engine.tax_rate_bps(Some("Narnia")), 1000);
        assert_eq!(engine.tax_rate_bps(None), 1000);
        assert_eq!(engine.tax_rate_bps(Some(" us ")), 700);
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // 0.5 cent rounds up, 0.4999 rounds down
        assert_eq!(apply_rate(5, 1000), Some(1));
        assert_eq!(apply_rate(4, 1000), Some(0));
        assert_eq!(apply_rate(12345, 1300), Some(1605));
    }

    #[test]
    fn test_rejects_empty_or_negative() {
        let engine = PricingEngine::default();
        let empty = FareRequest { base_fare_cents: 100, passengers: vec![], country: None };
        assert!(matches!(engine.quote(&empty), Err(PricingError::NoPassengers)));

        let negative = FareRequest {
            base_fare_cents: -1,
            passengers: vec![FarePassenger::economy()],
            country: None,
        };
        assert!(matches!(engine.quote(&negative), Err(PricingError::InvalidFare(-1))));
    }

    #[test]
    fn test_huge_bag_counts_overflow_instead_of_wrapping() {
        let engine = PricingEngine::default();
        let request = FareRequest {
            base_fare_cents: 20000,
            passengers: vec![
                FarePassenger { cabin: CabinClass::Economy, extra_bags: 1 << 31 },
                FarePassenger { cabin: CabinClass::Economy, extra_bags: 1 << 31 },
            ],
            country: Some("CA".to_string()),
        };
        assert!(matches!(engine.quote(&request), Err(PricingError::Overflow)));

        let huge_fare = FareRequest {
            base_fare_cents: i64::MAX / 2,
            passengers: vec![FarePassenger::economy(), FarePassenger::economy(), FarePassenger::economy()],
            country: None,
        };
        assert!(matches!(engine.quote(&huge_fare), Err(PricingError::Overflow)));
    }
}
