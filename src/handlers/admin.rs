use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::json_body;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus};
use crate::services::admin_query::{self, BookingQuery, BookingSummary};
use crate::services::session::{self, SessionSigner};
use crate::state::AppState;

/// Accepts the session cookie, or the same token as a bearer header for
/// non-browser clients.
fn check_auth(headers: &HeaderMap, sessions: &SessionSigner) -> Result<(), AppError> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(session::token_from_cookie_header);
    let from_bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if [from_cookie, from_bearer]
        .into_iter()
        .flatten()
        .any(|token| sessions.verify(token))
    {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

// POST /api/admin/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: Option<String>,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = json_body(payload)?;
    let expected = state
        .config
        .admin_password
        .as_deref()
        .ok_or_else(|| AppError::Config("Admin not configured".to_string()))?;

    let supplied = body.password.unwrap_or_default();
    if supplied.is_empty()
        || !constant_time_eq::constant_time_eq(supplied.as_bytes(), expected.as_bytes())
    {
        tracing::warn!("admin login rejected");
        return Err(AppError::Unauthorized);
    }

    let cookie = session::session_cookie(
        &state.sessions.issue(),
        state.sessions.max_age().num_seconds(),
        state.config.cookie_secure,
    );
    tracing::info!("admin session issued");
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({"success": true})),
    ))
}

// POST /api/admin/logout
pub async fn logout(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(
            header::SET_COOKIE,
            session::clear_session_cookie(state.config.cookie_secure),
        )],
        Json(serde_json::json!({"success": true})),
    )
}

// GET /api/admin/bookings
#[derive(Serialize)]
pub struct BookingsResponse {
    bookings: Vec<Booking>,
    summary: BookingSummary,
    storage_configured: bool,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingQuery>,
) -> Result<Json<BookingsResponse>, AppError> {
    check_auth(&headers, &state.sessions)?;

    let bookings = query.apply(state.store.list()?)?;
    let summary = admin_query::summarize(&bookings);

    Ok(Json(BookingsResponse {
        bookings,
        summary,
        storage_configured: state.store.is_configured(),
    }))
}

// GET /api/admin/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.sessions)?;
    Ok(Json(state.store.get(&id)?))
}

// POST /api/admin/bookings/:id/status
#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Serialize)]
pub struct StatusUpdateResponse {
    ok: bool,
    changed: bool,
    booking: Booking,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<Json<StatusUpdateResponse>, AppError> {
    check_auth(&headers, &state.sessions)?;
    let body = json_body(payload)?;

    let status = BookingStatus::parse(body.status.trim()).ok_or_else(|| {
        AppError::validation(format!("Unknown status: {}", body.status), vec!["status"])
    })?;
    let change = state.store.update_status(&id, status)?;

    Ok(Json(StatusUpdateResponse {
        ok: true,
        changed: change.changed,
        booking: change.booking,
    }))
}
