//! Visit API endpoints
//!
//! - GET  /api/v1/visits?role=tenant|owner
//! - POST /api/v1/visits
//! - PUT  /api/v1/visits/{id}/status

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::visit::{Visit, VisitStatus, VisitWithDetails};
use crate::services::VisitServiceError;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub role: PartyRole,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyRole {
    #[default]
    Tenant,
    Owner,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub property_id: i64,
    pub scheduled_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: VisitStatus,
}

impl From<VisitServiceError> for ApiError {
    fn from(e: VisitServiceError) -> Self {
        match e {
            VisitServiceError::Validation(msg) => ApiError::validation_error(msg),
            VisitServiceError::PropertyNotFound => ApiError::not_found("Listing not found"),
            VisitServiceError::NotFound => ApiError::not_found("Visit not found"),
            VisitServiceError::Forbidden => {
                ApiError::forbidden("Not allowed to update this visit")
            }
            VisitServiceError::Internal(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_visits).post(schedule_visit))
        .route("/{id}/status", put(update_visit_status))
}

/// GET /api/v1/visits
async fn list_visits(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<VisitWithDetails>>, ApiError> {
    let visits = match query.role {
        PartyRole::Tenant => state.visit_service.list_as_tenant(user.0.id).await?,
        PartyRole::Owner => state.visit_service.list_as_owner(user.0.id).await?,
    };
    Ok(Json(visits))
}

/// POST /api/v1/visits
async fn schedule_visit(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<ScheduleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let visit = state
        .visit_service
        .schedule(
            user.0.id,
            body.property_id,
            body.scheduled_at,
            body.notes.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(visit)))
}

/// PUT /api/v1/visits/{id}/status
async fn update_visit_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Visit>, ApiError> {
    Ok(Json(
        state
            .visit_service
            .update_status(&user.0, id, body.status)
            .await?,
    ))
}
