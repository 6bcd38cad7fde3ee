use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use super::pricing::{self, PricingError};
use super::reference::generate_booking_ref;
use crate::db::BookingStore;
use crate::errors::AppError;
use crate::models::{Booking, NewBooking, PaymentMethod, RoomType};

/// Raw booking form as posted by the site.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSubmission {
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub room_type: Option<String>,
    /// The form sends either a number or a numeric string.
    pub guests: Option<serde_json::Value>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub special_requests: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IntakeOutcome {
    pub booking: Booking,
    /// False when the store is not configured and the booking exists only
    /// in this response.
    pub persisted: bool,
}

const MAX_REF_ATTEMPTS: usize = 3;

fn required<'a>(
    value: &'a Option<String>,
    field: &'static str,
    missing: &mut Vec<&'static str>,
) -> &'a str {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => {
            missing.push(field);
            ""
        }
    }
}

/// Accepts a bare date (midnight) or a full timestamp.
pub fn parse_stay_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    // The guest's own calendar date is kept; the offset is dropped.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn parse_guests(value: Option<&serde_json::Value>) -> Result<i64, AppError> {
    let guests = match value {
        None | Some(serde_json::Value::Null) => return Ok(1),
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => return Ok(1),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    };
    match guests {
        Some(n) if n >= 1 => Ok(n),
        _ => Err(AppError::validation(
            "Guests must be a whole number of at least 1",
            vec!["guests"],
        )),
    }
}

/// Validates a submission and prices it. Nothing is written.
pub fn prepare_booking(
    submission: &BookingSubmission,
    booking_ref: String,
) -> Result<NewBooking, AppError> {
    let mut missing = vec![];
    let check_in = required(&submission.check_in, "checkIn", &mut missing);
    let check_out = required(&submission.check_out, "checkOut", &mut missing);
    let room_type = required(&submission.room_type, "roomType", &mut missing);
    let name = required(&submission.name, "name", &mut missing);
    let email = required(&submission.email, "email", &mut missing);
    let phone = required(&submission.phone, "phone", &mut missing);
    if !missing.is_empty() {
        return Err(AppError::validation("Missing required fields", missing));
    }

    let mut unparseable = vec![];
    let check_in_at = parse_stay_date(check_in);
    let check_out_at = parse_stay_date(check_out);
    if check_in_at.is_none() {
        unparseable.push("checkIn");
    }
    if check_out_at.is_none() {
        unparseable.push("checkOut");
    }
    let (Some(check_in_at), Some(check_out_at)) = (check_in_at, check_out_at) else {
        return Err(AppError::validation("Invalid date", unparseable));
    };
    if check_out_at <= check_in_at {
        return Err(AppError::validation(
            "Invalid date range",
            vec!["checkIn", "checkOut"],
        ));
    }

    let payment_method = match submission.payment_method.as_deref().map(str::trim) {
        None | Some("") => PaymentMethod::Manual,
        Some(other) => PaymentMethod::parse(other).ok_or_else(|| {
            AppError::validation("Unknown payment method", vec!["paymentMethod"])
        })?,
    };
    let guests = parse_guests(submission.guests.as_ref())?;
    let room_type = RoomType::parse_lenient(room_type);

    let quote = pricing::quote(room_type, check_in_at, check_out_at).map_err(
        |PricingError::InvalidDateRange| {
            AppError::validation("Invalid date range", vec!["checkIn", "checkOut"])
        },
    )?;

    Ok(NewBooking {
        booking_ref,
        check_in: check_in_at.date(),
        check_out: check_out_at.date(),
        nights: quote.nights,
        room_type,
        guests,
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        special_requests: submission
            .special_requests
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        subtotal: quote.subtotal,
        tax: quote.tax,
        total: quote.total,
        payment_method,
        status: payment_method.initial_status(),
    })
}

/// Validates, prices and stores a booking. A duplicate reference is retried
/// with a fresh one; an unconfigured store yields an unsaved booking.
pub fn create_booking(
    store: &BookingStore,
    submission: &BookingSubmission,
) -> Result<IntakeOutcome, AppError> {
    create_booking_with(store, submission, generate_booking_ref)
}

/// [`create_booking`] with the reference source supplied by the caller.
pub fn create_booking_with(
    store: &BookingStore,
    submission: &BookingSubmission,
    mut next_ref: impl FnMut() -> String,
) -> Result<IntakeOutcome, AppError> {
    let mut new = prepare_booking(submission, next_ref())?;

    for attempt in 1..=MAX_REF_ATTEMPTS {
        match store.insert(&new) {
            Ok(booking) => {
                tracing::info!(
                    booking_ref = %booking.booking_ref,
                    status = %booking.status,
                    total = %booking.total,
                    "booking created"
                );
                return Ok(IntakeOutcome {
                    booking,
                    persisted: true,
                });
            }
            Err(AppError::Conflict(existing)) if attempt < MAX_REF_ATTEMPTS => {
                tracing::warn!(booking_ref = %existing, attempt, "booking reference collision, regenerating");
                new.booking_ref = next_ref();
            }
            Err(AppError::StorageUnavailable) => {
                tracing::warn!(booking_ref = %new.booking_ref, "booking store unavailable, returning unsaved booking");
                return Ok(IntakeOutcome {
                    booking: unsaved(new, Utc::now().naive_utc()),
                    persisted: false,
                });
            }
            Err(e) => return Err(e),
        }
    }

    Err(AppError::Conflict(new.booking_ref))
}

fn unsaved(new: NewBooking, now: NaiveDateTime) -> Booking {
    Booking {
        id: format!("temp-{}", now.and_utc().timestamp_millis()),
        booking_ref: new.booking_ref,
        check_in: new.check_in,
        check_out: new.check_out,
        nights: new.nights,
        room_type: new.room_type,
        guests: new.guests,
        name: new.name,
        email: new.email,
        phone: new.phone,
        special_requests: new.special_requests,
        subtotal: new.subtotal,
        tax: new.tax,
        total: new.total,
        payment_method: new.payment_method,
        status: new.status,
        created_at: now,
        updated_at: now,
    }
}
