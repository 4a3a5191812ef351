use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::Slot;
use crate::services::availability;
use crate::state::AppState;

// GET /api/vendors/:vendor_id/availability?date=YYYY-MM-DD&duration=30
#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: String,
    pub duration: i64,
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(vendor_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<Slot>>, AppError> {
    let date = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("invalid date: {}", query.date)))?;

    let slots = availability::get_availability(
        &state,
        &vendor_id,
        date,
        query.duration,
        Local::now().naive_local(),
    )?;

    Ok(Json(slots))
}
