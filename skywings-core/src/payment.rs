use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use skywings_shared::Masked;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Mock,
    Card,
    Paypal,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Mock => "mock",
            PaymentMethod::Card => "card",
            PaymentMethod::Paypal => "paypal",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardDetails {
    pub number: Masked<String>,
    pub exp_month: u32,
    pub exp_year: i32,
    pub cvc: Masked<String>,
    #[serde(default)]
    pub holder_name: Option<String>,
}

#[derive(Debug, Clone)]
pub enum PaymentSource {
    Mock,
    Card(CardDetails),
    Paypal { payer_email: Masked<String> },
}

impl PaymentSource {
    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentSource::Mock => PaymentMethod::Mock,
            PaymentSource::Card(_) => PaymentMethod::Card,
            PaymentSource::Paypal { .. } => PaymentMethod::Paypal,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Booking reference the charge is made for
    pub reference: String,
    pub amount_cents: i64,
    pub currency: String,
    pub source: PaymentSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Succeeded,
    Declined,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub transaction_id: String,
    pub method: PaymentMethod,
    pub amount_cents: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The provider refused the charge; the text is shown to the payer
    #[error("{0}")]
    Declined(String),
    #[error("{0}")]
    InvalidDetails(String),
    #[error("Payment provider unavailable: {0}")]
    Provider(String),
}

#[async_trait]
pub trait PaymentAdapter: Send + Sync {
    async fn charge(&self, request: &PaymentRequest) -> Result<PaymentReceipt, PaymentError>;

    /// Reverses a charge whose booking could not be stored.
    async fn refund(&self, receipt: &PaymentReceipt) -> Result<(), PaymentError>;
}

/// Luhn checksum over the digits of `number`. Spaces and dashes are ignored.
pub fn luhn_valid(number: &str) -> bool {
    let digits: Vec<u32> = number
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default();

    if digits.len() < 12 || digits.len() > 19 {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                *d
            }
        })
        .sum();
    sum % 10 == 0
}

pub fn normalize_card_number(number: &str) -> String {
    number.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Checks the card fields a provider would reject before authorizing.
pub fn validate_card(card: &CardDetails, now: DateTime<Utc>) -> Result<(), PaymentError> {
    if !luhn_valid(&card.number.0) {
        return Err(PaymentError::InvalidDetails("Card number is invalid".to_string()));
    }
    if !(1..=12).contains(&card.exp_month) {
        return Err(PaymentError::InvalidDetails("Expiry month is invalid".to_string()));
    }
    let year = if card.exp_year < 100 { 2000 + card.exp_year } else { card.exp_year };
    let expired = (year, card.exp_month) < (now.year(), now.month());
    if expired {
        return Err(PaymentError::InvalidDetails("Card has expired".to_string()));
    }
    let cvc = card.cvc.0.trim();
    if !(3..=4).contains(&cvc.len()) || !cvc.chars().all(|c| c.is_ascii_digit()) {
        return Err(PaymentError::InvalidDetails("Security code is invalid".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn card(number: &str, month: u32, year: i32, cvc: &str) -> CardDetails {
        CardDetails {
            number: Masked(number.to_string()),
            exp_month: month,
            exp_year: year,
            cvc: Masked(cvc.to_string()),
            holder_name: None,
        }
    }

    #[test]
    fn test_luhn() {
        assert!(luhn_valid("4242 4242 4242 4242"));
        assert!(luhn_valid("4000-0000-0000-0002"));
        assert!(!luhn_valid("4242 4242 4242 4241"));
        assert!(!luhn_valid("4242abcd42424242"));
        assert!(!luhn_valid("42"));
    }

    #[test]
    fn test_card_validation() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap();

        assert!(validate_card(&card("4242424242424242", 10, 2026, "123"), now).is_ok());
        assert!(validate_card(&card("4242424242424242", 12, 30, "1234"), now).is_ok());
        assert!(matches!(
            validate_card(&card("4242424242424242", 9, 2026, "123"), now),
            Err(PaymentError::InvalidDetails(_))
        ));
        assert!(validate_card(&card("4242424242424242", 13, 2027, "123"), now).is_err());
        assert!(validate_card(&card("4242424242424242", 1, 2027, "12"), now).is_err());
        assert!(validate_card(&card("1234567812345678", 1, 2027, "123"), now).is_err());
    }

    #[test]
    fn test_card_number_is_masked_in_debug() {
        let c = card("4242424242424242", 1, 2027, "123");
        let debug = format!("{:?}", c);
        assert!(!debug.contains("4242424242424242"));
        assert_eq!(normalize_card_number("4242-4242 4242 4242"), "4242424242424242");
    }
}
