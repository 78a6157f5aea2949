//! Tenant passport API endpoints
//!
//! - GET  /api/v1/passport
//! - GET  /api/v1/passport/documents
//! - POST /api/v1/passport/documents

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::passport::{DocumentKind, Passport, PassportDocument};
use crate::services::PassportServiceError;

#[derive(Debug, Deserialize)]
pub struct AddDocumentRequest {
    pub kind: DocumentKind,
    pub file_url: String,
}

impl From<PassportServiceError> for ApiError {
    fn from(e: PassportServiceError) -> Self {
        match e {
            PassportServiceError::Validation(msg) => ApiError::validation_error(msg),
            PassportServiceError::Internal(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_passport))
        .route("/documents", get(list_documents).post(add_document))
}

/// GET /api/v1/passport - Created empty on first access
async fn get_passport(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Passport>, ApiError> {
    Ok(Json(state.passport_service.get_or_init(user.0.id).await?))
}

/// GET /api/v1/passport/documents
async fn list_documents(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<PassportDocument>>, ApiError> {
    Ok(Json(state.passport_service.documents(user.0.id).await?))
}

/// POST /api/v1/passport/documents - Returns the updated passport
async fn add_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<AddDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let passport = state
        .passport_service
        .add_document(user.0.id, body.kind, &body.file_url)
        .await?;
    Ok((StatusCode::CREATED, Json(passport)))
}
