use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Local;

use super::require_caller;
use crate::errors::AppError;
use crate::models::{BookingReceipt, BookingRequest};
use crate::services::booking;
use crate::state::AppState;

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<BookingRequest>,
) -> Result<Json<BookingReceipt>, AppError> {
    require_caller(&headers, &request.customer_id)?;

    let receipt = booking::create_booking(&state, request, Local::now().naive_local()).await?;
    Ok(Json(receipt))
}
