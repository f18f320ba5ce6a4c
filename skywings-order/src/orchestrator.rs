use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use skywings_catalog::{PriceBreakdown, PricingEngine, PricingError};
use skywings_core::flight::AIRLINE_NAME;
use skywings_core::payment::{normalize_card_number, validate_card, PaymentStatus};
use skywings_core::{
    BookingContext, BookingContextStore, FleetRepository, Flight, FlightRepository, PaymentAdapter,
    PaymentError, PaymentReceipt, PaymentRequest, PaymentSource, RepoError,
};
use skywings_shared::Masked;
use uuid::Uuid;

use crate::models::{NewBooking, NewBookingRecord, NewCustomer, PassengerEntry};
use crate::reference::generate_booking_reference;
use crate::repository::{BookingRecordRepository, BookingRepository};
use crate::seating::load_seat_map;

pub const CURRENCY: &str = "USD";
const REFERENCE_ATTEMPTS: usize = 5;

/// Who is checking out.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub session_id: String,
    /// Session subject that owns the resulting booking record
    pub owner: String,
    /// Set for signed-in customers
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    pub booking_ref: String,
    pub total_cents: i64,
    pub formatted_total: String,
    pub pricing: PriceBreakdown,
    pub payment: PaymentReceipt,
    pub record_id: i64,
    pub booking_id: Option<i64>,
}

/// Everything needed to store a paid checkout.
struct PendingOrder<'a> {
    session: &'a CheckoutSession,
    ctx: &'a BookingContext,
    flight: &'a Flight,
    booking_ref: &'a str,
    pricing: &'a PriceBreakdown,
    passengers: &'a [PassengerEntry],
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("No flight selected")]
    NoFlightSelected,
    #[error("Flight not found: {0}")]
    FlightNotFound(i64),
    #[error("Flight has already departed")]
    FlightDeparted,
    #[error("No free booking reference for flight {0}")]
    ReferencesExhausted(i64),
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error(transparent)]
    Repository(#[from] RepoError),
}

/// Turns a session's booking context into a paid booking
pub struct CheckoutService {
    flights: Arc<dyn FlightRepository>,
    fleet: Arc<dyn FleetRepository>,
    records: Arc<dyn BookingRecordRepository>,
    bookings: Arc<dyn BookingRepository>,
    contexts: Arc<dyn BookingContextStore>,
    payments: Arc<dyn PaymentAdapter>,
    pricing: Arc<PricingEngine>,
}

impl CheckoutService {
    pub fn new(
        flights: Arc<dyn FlightRepository>,
        fleet: Arc<dyn FleetRepository>,
        records: Arc<dyn BookingRecordRepository>,
        bookings: Arc<dyn BookingRepository>,
        contexts: Arc<dyn BookingContextStore>,
        payments: Arc<dyn PaymentAdapter>,
        pricing: Arc<PricingEngine>,
    ) -> Self {
        Self { flights, fleet, records, bookings, contexts, payments, pricing }
    }

    pub async fn finalize(
        &self,
        session: &CheckoutSession,
        source: PaymentSource,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let ctx = self
            .contexts
            .load(&session.session_id)
            .await?
            .unwrap_or_default();

        let flight_id = ctx.flight_id.ok_or(CheckoutError::NoFlightSelected)?;
        let flight = self
            .flights
            .get(flight_id)
            .await?
            .ok_or(CheckoutError::FlightNotFound(flight_id))?;
        if flight.depart_time <= Utc::now() {
            return Err(CheckoutError::FlightDeparted);
        }

        let pricing = self.pricing.quote(&ctx.fare_request(flight.price_cents, None))?;
        let passengers = self.passenger_entries(&ctx, flight_id).await?;
        let booking_ref = self.unused_reference(flight.id).await?;

        let method = source.method();
        let payment = self
            .payments
            .charge(&PaymentRequest {
                reference: booking_ref.clone(),
                amount_cents: pricing.total_cents,
                currency: CURRENCY.to_string(),
                source,
            })
            .await?;

        let order = PendingOrder {
            session,
            ctx: &ctx,
            flight: &flight,
            booking_ref: &booking_ref,
            pricing: &pricing,
            passengers: &passengers,
        };
        let (record_id, booking_id) = match self.persist(&order).await {
            Ok(ids) => ids,
            Err(e) => {
                self.compensate(&booking_ref, &payment).await;
                return Err(e);
            }
        };

        if let Err(e) = self.contexts.clear(&session.session_id).await {
            tracing::warn!(booking_ref = %booking_ref, error = %e, "Booking context not cleared");
        }

        tracing::info!(
            booking_ref = %booking_ref,
            flight_id = flight.id,
            method = method.as_str(),
            total_cents = pricing.total_cents,
            "Booking confirmed"
        );

        Ok(CheckoutReceipt {
            formatted_total: skywings_shared::format_cents(pricing.total_cents),
            total_cents: pricing.total_cents,
            booking_ref,
            pricing,
            payment,
            record_id,
            booking_id,
        })
    }

    /// A fresh reference not held by any stored record.
    async fn unused_reference(&self, flight_id: i64) -> Result<String, CheckoutError> {
        for _ in 0..REFERENCE_ATTEMPTS {
            let candidate = generate_booking_reference(flight_id);
            if self.records.find_by_ref(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }
        Err(CheckoutError::ReferencesExhausted(flight_id))
    }

    /// Stores the customer, the record and, for signed-in sessions, the
    /// account booking. Returns the record and booking ids.
    async fn persist(&self, order: &PendingOrder<'_>) -> Result<(i64, Option<i64>), CheckoutError> {
        let customer_id = match &order.ctx.lead_passenger {
            Some(lead) => Some(
                self.records
                    .create_customer(&NewCustomer {
                        first_name: lead.first_name.clone(),
                        last_name: lead.last_name.clone(),
                        email: lead.email.clone(),
                        phone: lead.phone.clone(),
                    })
                    .await?
                    .id,
            ),
            None => None,
        };

        let flight = order.flight;
        let record = self
            .records
            .create(&NewBookingRecord {
                booking_ref: order.booking_ref.to_string(),
                flight_id: flight.id,
                customer_id,
                owner: order.session.owner.clone(),
                total_paid_cents: order.pricing.total_cents,
                status: Some("On time".to_string()),
                passengers: order.passengers.to_vec(),
            })
            .await?;

        let Some(user_id) = order.session.user_id else {
            return Ok((record.id, None));
        };
        let booking = self
            .bookings
            .create(&NewBooking {
                user_id,
                flight_id: flight.id,
                airline: AIRLINE_NAME.to_string(),
                flight_number: flight.flight_number(),
                origin: flight.origin.clone(),
                destination: flight.destination.clone(),
                departure_time: flight.depart_time,
                arrival_time: flight.arrival_time(),
                ticket_class: order.passengers.first().map(|p| p.cabin).unwrap_or_default(),
                booking_reference: order.booking_ref.to_string(),
                total_paid_cents: order.pricing.total_cents,
                extras: serde_json::json!({
                    "passengers": order.passengers,
                    "pricing": order.pricing,
                }),
            })
            .await?;
        Ok((record.id, Some(booking.id)))
    }

    async fn compensate(&self, booking_ref: &str, payment: &PaymentReceipt) {
        match self.payments.refund(payment).await {
            Ok(()) => tracing::warn!(
                booking_ref = %booking_ref,
                transaction_id = %payment.transaction_id,
                "Booking not stored, payment refunded"
            ),
            Err(e) => tracing::error!(
                booking_ref = %booking_ref,
                transaction_id = %payment.transaction_id,
                amount_cents = payment.amount_cents,
                error = %e,
                "Booking not stored and refund failed"
            ),
        }
    }

    /// Passenger entries for the record. Seats taken by someone else since
    /// they were picked are dropped.
    async fn passenger_entries(
        &self,
        ctx: &BookingContext,
        flight_id: i64,
    ) -> Result<Vec<PassengerEntry>, CheckoutError> {
        let seat_map = load_seat_map(
            flight_id,
            self.fleet.as_ref(),
            self.records.as_ref(),
            self.bookings.as_ref(),
        )
        .await?;

        let requested: Vec<Option<String>> = (0..ctx.passenger_count as usize)
            .map(|i| ctx.seat_for(i))
            .collect();
        let selection = seat_map.validate_selection(&requested);
        if !selection.rejected.is_empty() {
            tracing::warn!(flight_id, seats = ?selection.rejected, "Dropping seats taken since selection");
        }

        Ok(ctx
            .passengers_or_default()
            .iter()
            .enumerate()
            .map(|(i, pref)| {
                PassengerEntry::from_preference(i, pref, selection.seats.get(i).cloned().flatten())
            })
            .collect())
    }
}

/// Simulated gateway for every payment method.
pub struct MockPaymentAdapter {
    /// Card number that is always declined
    decline_card: Option<String>,
}

pub const DECLINE_MESSAGE: &str = "Your card was declined.";

impl MockPaymentAdapter {
    pub fn new(decline_card: Option<String>) -> Self {
        Self {
            decline_card: decline_card.map(|n| normalize_card_number(&n)).filter(|n| !n.is_empty()),
        }
    }
}

impl Default for MockPaymentAdapter {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait::async_trait]
impl PaymentAdapter for MockPaymentAdapter {
    async fn charge(&self, request: &PaymentRequest) -> Result<PaymentReceipt, PaymentError> {
        if request.amount_cents <= 0 {
            return Err(PaymentError::InvalidDetails("Nothing to charge".to_string()));
        }

        match &request.source {
            PaymentSource::Mock => {}
            PaymentSource::Card(card) => {
                validate_card(card, Utc::now())?;
                let number = normalize_card_number(&card.number.0);
                if self.decline_card.as_deref() == Some(number.as_str()) {
                    tracing::info!(reference = %request.reference, card = %Masked(number.as_str()), "Card declined");
                    return Err(PaymentError::Declined(DECLINE_MESSAGE.to_string()));
                }
            }
            PaymentSource::Paypal { payer_email } => {
                if !skywings_core::context::looks_like_email(payer_email.0.trim()) {
                    return Err(PaymentError::InvalidDetails(
                        "A valid PayPal email is required".to_string(),
                    ));
                }
            }
        }

        Ok(PaymentReceipt {
            transaction_id: format!("mock_txn_{}", Uuid::new_v4().simple()),
            method: request.source.method(),
            amount_cents: request.amount_cents,
            currency: request.currency.clone(),
            status: PaymentStatus::Succeeded,
            created_at: Utc::now(),
        })
    }

    async fn refund(&self, receipt: &PaymentReceipt) -> Result<(), PaymentError> {
        tracing::info!(transaction_id = %receipt.transaction_id, amount_cents = receipt.amount_cents, "Mock refund");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use skywings_core::payment::CardDetails;

    fn request(source: PaymentSource) -> PaymentRequest {
        PaymentRequest {
            reference: "SW0001000001".to_string(),
            amount_cents: 22600,
            currency: CURRENCY.to_string(),
            source,
        }
    }

    fn card(number: &str) -> PaymentSource {
        PaymentSource::Card(CardDetails {
            number: Masked(number.to_string()),
            exp_month: 12,
            exp_year: Utc::now().year() + 2,
            cvc: Masked("123".to_string()),
            holder_name: None,
        })
    }

    #[tokio::test]
    async fn test_mock_method_succeeds() {
        let receipt = MockPaymentAdapter::default()
            .charge(&request(PaymentSource::Mock))
            .await
            .unwrap();
        assert_eq!(receipt.status, PaymentStatus::Succeeded);
        assert!(receipt.transaction_id.starts_with("mock_txn_"));
        assert_eq!(receipt.amount_cents, 22600);
    }

    #[tokio::test]
    async fn test_card_decline_number() {
        let adapter = MockPaymentAdapter::new(Some("4000 0000 0000 0002".to_string()));
        let err = adapter.charge(&request(card("4000000000000002"))).await.unwrap_err();
        assert_eq!(err.to_string(), DECLINE_MESSAGE);

        assert!(adapter.charge(&request(card("4242424242424242"))).await.is_ok());
        assert!(matches!(
            adapter.charge(&request(card("4242424242424241"))).await,
            Err(PaymentError::InvalidDetails(_))
        ));
    }

    #[tokio::test]
    async fn test_paypal_requires_email() {
        let adapter = MockPaymentAdapter::default();
        let bad = PaymentSource::Paypal { payer_email: Masked("nobody".to_string()) };
        assert!(adapter.charge(&request(bad)).await.is_err());

        let good = PaymentSource::Paypal { payer_email: Masked("payer@example.com".to_string()) };
        let receipt = adapter.charge(&request(good)).await.unwrap();
        assert_eq!(receipt.method, skywings_core::PaymentMethod::Paypal);
    }
}
