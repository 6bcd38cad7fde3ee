use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::json_body;
use crate::errors::AppError;
use crate::models::{BookingStatus, ChargeRequest, MetadataField, Money};
use crate::services::reconcile;
use crate::state::AppState;

// POST /api/payments/initialize
#[derive(Deserialize)]
pub struct InitializeRequest {
    pub email: Option<String>,
    pub amount: Option<Money>,
    #[serde(alias = "bookingRef")]
    pub booking_ref: Option<String>,
    #[serde(default)]
    pub metadata: Vec<MetadataField>,
}

#[derive(Serialize)]
pub struct InitializeResponse {
    success: bool,
    authorization_url: String,
    access_code: Option<String>,
    reference: String,
}

pub async fn initialize_payment(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InitializeRequest>, JsonRejection>,
) -> Result<Json<InitializeResponse>, AppError> {
    let body = json_body(payload)?;

    let email = body.email.as_deref().map(str::trim).unwrap_or_default();
    let booking_ref = body.booking_ref.as_deref().map(str::trim).unwrap_or_default();
    let amount = body.amount.filter(|a| !a.is_zero());

    let mut missing = vec![];
    if email.is_empty() {
        missing.push("email");
    }
    if amount.is_none() {
        missing.push("amount");
    }
    if booking_ref.is_empty() {
        missing.push("booking_ref");
    }
    let Some(amount) = amount.filter(|_| missing.is_empty()) else {
        return Err(AppError::validation("Missing required fields", missing));
    };

    // A stored booking must still be payable and is charged its stored total.
    match state.store.get(booking_ref) {
        Ok(booking) => {
            if !booking.status.can_transition_to(BookingStatus::Paid) {
                return Err(AppError::IllegalTransition {
                    from: booking.status,
                    to: BookingStatus::Paid,
                });
            }
            if booking.total != amount {
                return Err(AppError::validation(
                    format!("Amount does not match booking total of {}", booking.total),
                    vec!["amount"],
                ));
            }
        }
        Err(AppError::NotFound(_) | AppError::StorageUnavailable) => {}
        Err(e) => return Err(e),
    }

    let gateway = state.gateway()?;
    let session = gateway
        .initialize(&ChargeRequest {
            email: email.to_string(),
            amount,
            reference: booking_ref.to_string(),
            callback_url: state.config.payment_callback_url(),
            metadata: body.metadata,
        })
        .await?;

    Ok(Json(InitializeResponse {
        success: true,
        authorization_url: session.authorization_url,
        access_code: session.access_code,
        reference: session.reference,
    }))
}

// GET /api/payments/verify?reference=...
#[derive(Deserialize)]
pub struct VerifyQuery {
    pub reference: Option<String>,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    success: bool,
    transaction: serde_json::Value,
    booking_ref: Option<String>,
    booking_status: Option<BookingStatus>,
    booking_updated: bool,
}

pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<VerifyResponse>, AppError> {
    let reference = query
        .reference
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::validation("Reference is required", vec!["reference"]))?;

    let outcome = reconcile::reconcile(&state.store, state.gateway()?, reference).await?;

    Ok(Json(VerifyResponse {
        success: outcome.success,
        transaction: outcome.verification.raw,
        booking_ref: outcome.booking_ref,
        booking_status: outcome.booking_status,
        booking_updated: outcome.updated,
    }))
}
