//! Rental application API endpoints
//!
//! - GET  /api/v1/applications?role=tenant|owner
//! - POST /api/v1/applications
//! - PUT  /api/v1/applications/{id}/decision

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::visits::PartyRole;
use crate::models::application::{Application, ApplicationWithDetails};
use crate::services::ApplicationServiceError;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub role: PartyRole,
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub property_id: i64,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub accept: bool,
    pub response_message: Option<String>,
}

impl From<ApplicationServiceError> for ApiError {
    fn from(e: ApplicationServiceError) -> Self {
        match e {
            ApplicationServiceError::Validation(msg) => ApiError::validation_error(msg),
            ApplicationServiceError::PropertyNotFound => ApiError::not_found("Listing not found"),
            ApplicationServiceError::NotFound => ApiError::not_found("Application not found"),
            ApplicationServiceError::AlreadyApplied => {
                ApiError::conflict("You already applied to this listing")
            }
            ApplicationServiceError::Forbidden => {
                ApiError::forbidden("Not allowed to decide this application")
            }
            ApplicationServiceError::Internal(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_applications).post(apply))
        .route("/{id}/decision", put(decide_application))
}

/// GET /api/v1/applications
async fn list_applications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ApplicationWithDetails>>, ApiError> {
    let applications = match query.role {
        PartyRole::Tenant => state.application_service.list_as_tenant(user.0.id).await?,
        PartyRole::Owner => state.application_service.list_as_owner(user.0.id).await?,
    };
    Ok(Json(applications))
}

/// POST /api/v1/applications
async fn apply(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<ApplyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let application = state
        .application_service
        .apply(user.0.id, body.property_id, body.message.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

/// PUT /api/v1/applications/{id}/decision
async fn decide_application(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<DecisionRequest>,
) -> Result<Json<Application>, ApiError> {
    Ok(Json(
        state
            .application_service
            .decide(&user.0, id, body.accept, body.response_message.as_deref())
            .await?,
    ))
}
