use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::json;

use super::json_body;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::{Booking, ChargeRequest, MetadataField, PaymentMethod};
use crate::services::intake::{self, BookingSubmission};
use crate::services::payment::{GatewayError, PaymentGateway};
use crate::state::AppState;

const PAYMENT_FALLBACK: &str = "Payment could not be processed. Try again or pay on arrival.";

#[derive(Serialize)]
pub struct SubmitResponse {
    success: bool,
    booking: Booking,
    persisted: bool,
    requires_payment: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    authorization_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

// POST /api/bookings
pub async fn submit_booking(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BookingSubmission>, JsonRejection>,
) -> Result<Json<SubmitResponse>, AppError> {
    let submission = json_body(payload)?;

    // A gateway booking without a configured gateway is refused before
    // anything is written.
    let wants_gateway = submission
        .payment_method
        .as_deref()
        .and_then(PaymentMethod::parse)
        == Some(PaymentMethod::Paystack);
    let gateway = if wants_gateway {
        Some(state.gateway()?)
    } else {
        None
    };

    let outcome = intake::create_booking(&state.store, &submission)?;
    let booking = outcome.booking;

    let Some(gateway) = gateway.filter(|_| booking.payment_method == PaymentMethod::Paystack)
    else {
        return Ok(Json(SubmitResponse {
            success: true,
            booking,
            persisted: outcome.persisted,
            requires_payment: false,
            authorization_url: None,
            payment_error: None,
            message: Some(
                "Booking request received. Our team will contact you shortly.".to_string(),
            ),
        }));
    };

    let (authorization_url, payment_error) =
        match start_payment(gateway, &state.config, &booking).await {
            Ok(url) => (Some(url), None),
            Err(e) => {
                tracing::warn!(booking_ref = %booking.booking_ref, error = %e, "could not start online payment");
                let message = match e {
                    GatewayError::Rejected { message, .. } => {
                        format!("{message}. {PAYMENT_FALLBACK}")
                    }
                    _ => PAYMENT_FALLBACK.to_string(),
                };
                (None, Some(message))
            }
        };

    Ok(Json(SubmitResponse {
        success: true,
        booking,
        persisted: outcome.persisted,
        requires_payment: true,
        authorization_url,
        payment_error,
        message: None,
    }))
}

async fn start_payment(
    gateway: &dyn PaymentGateway,
    config: &AppConfig,
    booking: &Booking,
) -> Result<String, GatewayError> {
    let request = ChargeRequest {
        email: booking.email.clone(),
        amount: booking.total,
        reference: booking.booking_ref.clone(),
        callback_url: config.payment_callback_url(),
        metadata: vec![
            MetadataField {
                display_name: "Guest Name".to_string(),
                variable_name: "guest_name".to_string(),
                value: json!(booking.name),
            },
            MetadataField {
                display_name: "Room Type".to_string(),
                variable_name: "room_type".to_string(),
                value: json!(booking.room_type.as_str()),
            },
            MetadataField {
                display_name: "Nights".to_string(),
                variable_name: "nights".to_string(),
                value: json!(booking.nights),
            },
        ],
    };

    let session = gateway.initialize(&request).await?;
    tracing::info!(booking_ref = %booking.booking_ref, "payment session opened");
    Ok(session.authorization_url)
}
