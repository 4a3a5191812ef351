pub mod appointments;
pub mod availability;
pub mod bookings;
pub mod calendar;
pub mod health;
pub mod notifications;
pub mod vendors;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::state::AppState;

/// Set by the authentication layer in front of this service.
pub const CALLER_HEADER: &str = "x-user-id";

pub fn caller_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require_caller(headers: &HeaderMap, expected: &str) -> Result<(), AppError> {
    match caller_id(headers) {
        None => Err(AppError::Unauthorized),
        Some(id) if id == expected => Ok(()),
        Some(_) => Err(AppError::Forbidden("not allowed to act for this account".to_string())),
    }
}

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

/// Page size for listing routes; SQLite reads a negative LIMIT as unbounded.
fn page_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/vendors/:vendor_id",
            put(vendors::upsert_vendor),
        )
        .route(
            "/api/vendors/:vendor_id/availability",
            get(availability::get_availability),
        )
        .route(
            "/api/vendors/:vendor_id/schedule",
            put(vendors::update_schedule),
        )
        .route(
            "/api/vendors/:vendor_id/calendar",
            put(vendors::connect_calendar).delete(vendors::disconnect_calendar),
        )
        .route("/api/bookings", post(bookings::create_booking))
        .route(
            "/api/vendors/:vendor_id/appointments",
            get(appointments::list_vendor_appointments),
        )
        .route(
            "/api/vendors/:vendor_id/appointments/unread",
            get(appointments::unread_count),
        )
        .route(
            "/api/vendors/:vendor_id/appointments/read",
            post(appointments::mark_read),
        )
        .route(
            "/api/vendors/:vendor_id/appointments/:appointment_id/status",
            post(appointments::update_status),
        )
        .route(
            "/api/customers/:customer_id/appointments",
            get(appointments::list_customer_appointments),
        )
        .route(
            "/api/users/:user_id/notifications",
            get(notifications::list_notifications),
        )
        .route(
            "/calendar/:vendor_id/:appointment_id",
            get(calendar::download_ics),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
