use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Local;
use serde::Deserialize;

use super::{caller_id, page_limit, require_caller};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Appointment, AppointmentStatus};
use crate::services::appointments::{self, StatusUpdate};
use crate::state::AppState;

// POST /api/vendors/:vendor_id/appointments/:appointment_id/status
#[derive(Deserialize)]
pub struct StatusChangeRequest {
    pub status: AppointmentStatus,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path((vendor_id, appointment_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<StatusChangeRequest>,
) -> Result<Json<StatusUpdate>, AppError> {
    let caller = caller_id(&headers);

    let update = appointments::update_appointment_status(
        &state,
        &appointment_id,
        &vendor_id,
        caller.as_deref(),
        body.status,
        Local::now().naive_local(),
    )
    .await?;

    Ok(Json(update))
}

// GET /api/vendors/:vendor_id/appointments
#[derive(Deserialize)]
pub struct AppointmentsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_vendor_appointments(
    State(state): State<Arc<AppState>>,
    Path(vendor_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    require_caller(&headers, &vendor_id)?;

    let status = query
        .status
        .as_deref()
        .map(str::parse::<AppointmentStatus>)
        .transpose()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let limit = page_limit(query.limit);

    let appointments = {
        let db = state.db()?;
        queries::list_vendor_appointments(&db, &vendor_id, status, limit)?
    };

    Ok(Json(appointments))
}

// GET /api/customers/:customer_id/appointments
pub async fn list_customer_appointments(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    require_caller(&headers, &customer_id)?;

    let appointments = {
        let db = state.db()?;
        queries::list_customer_appointments(&db, &customer_id, page_limit(query.limit))?
    };

    Ok(Json(appointments))
}

// GET /api/vendors/:vendor_id/appointments/unread
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    Path(vendor_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    require_caller(&headers, &vendor_id)?;

    let unread = {
        let db = state.db()?;
        queries::count_unread_appointments(&db, &vendor_id)?
    };

    Ok(Json(serde_json::json!({ "unread": unread })))
}

// POST /api/vendors/:vendor_id/appointments/read
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(vendor_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    require_caller(&headers, &vendor_id)?;

    let updated = {
        let db = state.db()?;
        queries::mark_appointments_read(&db, &vendor_id)?
    };

    Ok(Json(serde_json::json!({ "ok": true, "updated": updated })))
}
