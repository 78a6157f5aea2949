//! Notification API endpoints
//!
//! - GET /api/v1/notifications?unread_only=true
//! - PUT /api/v1/notifications/{id}/read
//! - PUT /api/v1/notifications/read-all

use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::Notification;
use crate::services::NotificationServiceError;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread_only: bool,
}

impl From<NotificationServiceError> for ApiError {
    fn from(e: NotificationServiceError) -> Self {
        match e {
            NotificationServiceError::NotFound => ApiError::not_found("Notification not found"),
            NotificationServiceError::Internal(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/{id}/read", put(mark_read))
        .route("/read-all", put(mark_all_read))
}

/// GET /api/v1/notifications
async fn list_notifications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(
        state
            .notification_service
            .list(user.0.id, query.unread_only)
            .await?,
    ))
}

/// PUT /api/v1/notifications/{id}/read
async fn mark_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.notification_service.mark_read(user.0.id, id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// PUT /api/v1/notifications/read-all
async fn mark_all_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let changed = state.notification_service.mark_all_read(user.0.id).await?;
    Ok(Json(serde_json::json!({ "ok": true, "changed": changed })))
}
