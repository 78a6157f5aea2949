//! Admin API endpoints
//!
//! Moderation and account management, all behind the admin middleware:
//! - POST /api/v1/admin/properties/publish
//! - GET  /api/v1/admin/users
//! - PUT  /api/v1/admin/users/{id}/active
//! - GET  /api/v1/admin/audit

use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::auth::UserResponse;
use crate::api::common::{Paginated, PaginationQuery};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::AuditEntry;

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub changed: u64,
}

#[derive(Debug, Deserialize)]
pub struct ActiveRequest {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    #[serde(default = "default_audit_limit")]
    pub limit: i64,
}

fn default_audit_limit() -> i64 {
    50
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/properties/publish", post(batch_publish))
        .route("/users", get(list_users))
        .route("/users/{id}/active", put(set_user_active))
        .route("/audit", get(list_audit))
}

/// POST /api/v1/admin/properties/publish - Publish pending listings in bulk
async fn batch_publish(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<PublishRequest>,
) -> Result<Json<PublishResponse>, ApiError> {
    let changed = state
        .property_service
        .batch_publish(&user.0, &body.ids)
        .await?;
    Ok(Json(PublishResponse { changed }))
}

/// GET /api/v1/admin/users
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<Paginated<UserResponse>>, ApiError> {
    let (users, total) = state
        .user_service
        .list_users(query.page, query.per_page)
        .await?;

    let items = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(Paginated::new(items, total, query.page, query.per_page)))
}

/// PUT /api/v1/admin/users/{id}/active - Enable or disable an account
async fn set_user_active(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ActiveRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.user_service.set_active(id, body.active).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// GET /api/v1/admin/audit - Most recent audit entries
async fn list_audit(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEntry>>, ApiError> {
    let limit = query.limit.clamp(1, 500);
    let entries = state
        .audit_repo
        .list_recent(limit)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;
    Ok(Json(entries))
}
