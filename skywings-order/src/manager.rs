use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use skywings_core::Flight;

use crate::models::{Booking, BookingRecord, BookingStatus};

pub const DEFAULT_REBOOK_CUTOFF_MINUTES: i64 = 120;
pub const RECORD_CANCELED: &str = "Cancelled";
pub const RECORD_REBOOKED: &str = "On time";
pub const RECORD_DEPARTED: &str = "Departed";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Cancellation and rebooking rules for both booking paths
#[derive(Debug, Clone)]
pub struct BookingManager {
    rebook_cutoff: Duration,
}

impl BookingManager {
    pub fn new(rebook_cutoff_minutes: i64) -> Self {
        Self {
            rebook_cutoff: Duration::minutes(rebook_cutoff_minutes.max(0)),
        }
    }

    pub fn rebook_cutoff(&self) -> Duration {
        self.rebook_cutoff
    }

    /// Transition: UPCOMING → CANCELED
    pub fn cancel_booking(
        &self,
        booking: &mut Booking,
        request: &CancelRequest,
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        if !booking.can_cancel(now) {
            return Err(BookingError::NotCancellable);
        }
        if !request.acknowledged {
            return Err(BookingError::AcknowledgementRequired);
        }

        booking.status = BookingStatus::Canceled;
        booking.cancellation_reason = request
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        booking.cancellation_ack = true;
        booking.canceled_at = Some(now);
        booking.updated_at = now;
        Ok(())
    }

    /// Transition: CANCELED → UPCOMING, only while the flight is far enough out
    pub fn rebook_booking(&self, booking: &mut Booking, now: DateTime<Utc>) -> Result<(), BookingError> {
        if booking.status != BookingStatus::Canceled {
            return Err(BookingError::NotCanceled);
        }
        if booking.departure_time <= now + self.rebook_cutoff {
            return Err(BookingError::FlightUnavailable);
        }

        booking.status = BookingStatus::Upcoming;
        booking.cancellation_reason = None;
        booking.cancellation_ack = false;
        booking.canceled_at = None;
        booking.updated_at = now;
        Ok(())
    }

    /// Marks a guest record canceled; a reason is noted on every passenger.
    /// Records already canceled or whose flight has left are refused.
    pub fn cancel_record(
        &self,
        record: &mut BookingRecord,
        flight: &Flight,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        if record.is_canceled() || flight.depart_time <= now {
            return Err(BookingError::NotCancellable);
        }
        mark_record_canceled(record, reason, now);
        Ok(())
    }

    pub fn rebook_record(
        &self,
        record: &mut BookingRecord,
        flight: &Flight,
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        if flight.depart_time <= now + self.rebook_cutoff || flight.is_canceled() {
            return Err(BookingError::FlightUnavailable);
        }
        record.status = Some(RECORD_REBOOKED.to_string());
        record.updated_at = now;
        Ok(())
    }

    /// Copies an account booking's state onto the record checked out with it.
    pub fn mirror_onto_record(&self, record: &mut BookingRecord, booking: &Booking, now: DateTime<Utc>) {
        match booking.status {
            BookingStatus::Canceled if !record.is_canceled() => {
                mark_record_canceled(record, booking.cancellation_reason.as_deref(), now)
            }
            BookingStatus::Canceled => {}
            BookingStatus::Upcoming | BookingStatus::Completed => {
                record.status = Some(RECORD_REBOOKED.to_string());
                record.updated_at = now;
            }
        }
    }

    /// Copies a record's cancel or rebook onto the account booking that shares
    /// its reference.
    pub fn mirror_onto_booking(
        &self,
        booking: &mut Booking,
        record: &BookingRecord,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) {
        if record.is_canceled() {
            if booking.status == BookingStatus::Canceled {
                return;
            }
            booking.status = BookingStatus::Canceled;
            booking.cancellation_reason = reason.map(str::trim).filter(|r| !r.is_empty()).map(str::to_string);
            booking.cancellation_ack = true;
            booking.canceled_at = Some(now);
        } else {
            booking.status = BookingStatus::Upcoming;
            booking.cancellation_reason = None;
            booking.cancellation_ack = false;
            booking.canceled_at = None;
        }
        booking.updated_at = now;
    }
}

fn mark_record_canceled(record: &mut BookingRecord, reason: Option<&str>, now: DateTime<Utc>) {
    record.status = Some(RECORD_CANCELED.to_string());
    if let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) {
        for passenger in &mut record.passengers {
            passenger.notes.push(format!("Cancellation reason: {}", reason));
        }
    }
    record.updated_at = now;
}

impl Default for BookingManager {
    fn default() -> Self {
        Self::new(DEFAULT_REBOOK_CUTOFF_MINUTES)
    }
}

/// Display status of a guest record. A record whose flight has left and that
/// was not canceled reads as departed.
pub fn record_status(record: &BookingRecord, flight: &Flight, now: DateTime<Utc>) -> String {
    let current = record
        .status
        .clone()
        .or_else(|| flight.status.clone())
        .unwrap_or_else(|| RECORD_REBOOKED.to_string());

    if flight.depart_time <= now && !current.to_ascii_lowercase().contains("cancel") {
        RECORD_DEPARTED.to_string()
    } else {
        current
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Booking not found")]
    NotFound,

    #[error("Missing booking_ref")]
    MissingReference,

    #[error("This flight can no longer be canceled online.")]
    NotCancellable,

    #[error("You must acknowledge the cancellation policy.")]
    AcknowledgementRequired,

    #[error("Only canceled bookings can be rebooked.")]
    NotCanceled,

    #[error("Flight no longer available")]
    FlightUnavailable,
}
