use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};

use super::caller_id;
use crate::db::queries;
use crate::errors::AppError;
use crate::services::calendar::ics::generate_ics;
use crate::state::AppState;

// GET /calendar/:vendor_id/:appointment_id(.ics)
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    Path((vendor_id, raw_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let appointment_id = raw_id.strip_suffix(".ics").unwrap_or(&raw_id);
    let caller = caller_id(&headers).ok_or(AppError::Unauthorized)?;

    let (appointment, business_name) = {
        let db = state.db()?;
        let appointment = queries::get_appointment(&db, &vendor_id, appointment_id)?
            .ok_or_else(|| AppError::NotFound("appointment not found".to_string()))?;
        // The file carries the customer's contact details.
        if caller != appointment.vendor_id && caller != appointment.customer_id {
            return Err(AppError::Forbidden(
                "only the vendor or the customer can download this appointment".to_string(),
            ));
        }
        let business_name = queries::get_vendor(&db, &vendor_id)?
            .map(|v| v.business_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Appointment".to_string());
        (appointment, business_name)
    };

    let ics = generate_ics(
        &appointment,
        &business_name,
        state.config.default_appointment_minutes,
    );
    let filename = format!("appointment-{appointment_id}.ics");

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        ics,
    )
        .into_response())
}
