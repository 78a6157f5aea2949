//! Favorite API endpoints
//!
//! - GET    /api/v1/favorites
//! - POST   /api/v1/favorites/{property_id}
//! - DELETE /api/v1/favorites/{property_id}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::FavoriteWithProperty;
use crate::services::FavoriteServiceError;

impl From<FavoriteServiceError> for ApiError {
    fn from(e: FavoriteServiceError) -> Self {
        match e {
            FavoriteServiceError::PropertyNotFound => ApiError::not_found("Listing not found"),
            FavoriteServiceError::NotFound => ApiError::not_found("Favorite not found"),
            FavoriteServiceError::Internal(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites))
        .route("/{property_id}", post(add_favorite).delete(remove_favorite))
}

/// GET /api/v1/favorites
async fn list_favorites(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<FavoriteWithProperty>>, ApiError> {
    Ok(Json(state.favorite_service.list(user.0.id).await?))
}

/// POST /api/v1/favorites/{property_id} - Idempotent
async fn add_favorite(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(property_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let favorite = state.favorite_service.add(user.0.id, property_id).await?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

/// DELETE /api/v1/favorites/{property_id}
async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(property_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.favorite_service.remove(user.0.id, property_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
