use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use super::{page_limit, require_caller};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::Notification;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct NotificationsQuery {
    pub limit: Option<i64>,
}

// GET /api/users/:user_id/notifications
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<Vec<Notification>>, AppError> {
    require_caller(&headers, &user_id)?;

    let notifications = {
        let db = state.db()?;
        queries::list_notifications(&db, &user_id, page_limit(query.limit))?
    };

    Ok(Json(notifications))
}
