pub mod admin;
pub mod bookings;
pub mod health;
pub mod payments;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::errors::AppError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/bookings", post(bookings::submit_booking))
        .route("/api/payments/initialize", post(payments::initialize_payment))
        .route("/api/payments/verify", get(payments::verify_payment))
        .route("/api/admin/login", post(admin::login))
        .route("/api/admin/logout", post(admin::logout))
        .route("/api/admin/bookings", get(admin::get_bookings))
        .route("/api/admin/bookings/:id", get(admin::get_booking))
        .route("/api/admin/bookings/:id/status", post(admin::update_status))
        .with_state(state)
}

/// Malformed JSON is a client error with the same shape as any other
/// validation failure.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::validation(rejection.body_text(), vec![]))
}
