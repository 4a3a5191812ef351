use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use super::require_caller;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{CalendarConnection, Schedule, Vendor};
use crate::state::AppState;

// PUT /api/vendors/:vendor_id
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorProfile {
    pub business_name: String,
    #[serde(default)]
    pub schedule: Option<Schedule>,
}

pub async fn upsert_vendor(
    State(state): State<Arc<AppState>>,
    Path(vendor_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<VendorProfile>,
) -> Result<Json<Vendor>, AppError> {
    require_caller(&headers, &vendor_id)?;

    if body.business_name.trim().is_empty() {
        return Err(AppError::validation("businessName is required"));
    }
    if let Some(schedule) = &body.schedule {
        schedule
            .validate()
            .map_err(|e| AppError::validation(e.to_string()))?;
    }

    let vendor = Vendor {
        id: vendor_id,
        business_name: body.business_name.trim().to_string(),
        schedule: body.schedule,
    };
    {
        let db = state.db()?;
        queries::save_vendor(&db, &vendor)?;
    }

    tracing::info!(vendor_id = %vendor.id, "vendor profile saved");
    Ok(Json(vendor))
}

// PUT /api/vendors/:vendor_id/schedule
pub async fn update_schedule(
    State(state): State<Arc<AppState>>,
    Path(vendor_id): Path<String>,
    headers: HeaderMap,
    Json(schedule): Json<Schedule>,
) -> Result<Json<Schedule>, AppError> {
    require_caller(&headers, &vendor_id)?;

    schedule
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let updated = {
        let db = state.db()?;
        queries::update_vendor_schedule(&db, &vendor_id, &schedule)?
    };
    if !updated {
        return Err(AppError::NotFound(format!("vendor {vendor_id} not found")));
    }

    tracing::info!(vendor_id = %vendor_id, "schedule updated");
    Ok(Json(schedule))
}

// PUT /api/vendors/:vendor_id/calendar
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectCalendarRequest {
    #[serde(default = "primary_calendar")]
    pub calendar_id: String,
    pub access_token: String,
}

fn primary_calendar() -> String {
    "primary".to_string()
}

pub async fn connect_calendar(
    State(state): State<Arc<AppState>>,
    Path(vendor_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ConnectCalendarRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_caller(&headers, &vendor_id)?;

    if body.access_token.trim().is_empty() {
        return Err(AppError::validation("accessToken is required"));
    }

    {
        let db = state.db()?;
        if queries::get_vendor(&db, &vendor_id)?.is_none() {
            return Err(AppError::NotFound(format!("vendor {vendor_id} not found")));
        }
        queries::save_calendar_connection(
            &db,
            &CalendarConnection {
                vendor_id: vendor_id.clone(),
                calendar_id: body.calendar_id,
                access_token: body.access_token,
            },
        )?;
    }

    tracing::info!(vendor_id = %vendor_id, "calendar connected");
    Ok(Json(serde_json::json!({ "connected": true })))
}

// DELETE /api/vendors/:vendor_id/calendar
pub async fn disconnect_calendar(
    State(state): State<Arc<AppState>>,
    Path(vendor_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    require_caller(&headers, &vendor_id)?;

    let removed = {
        let db = state.db()?;
        queries::delete_calendar_connection(&db, &vendor_id)?
    };

    Ok(Json(serde_json::json!({ "connected": false, "removed": removed })))
}
