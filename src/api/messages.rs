//! Messaging API endpoints
//!
//! - GET  /api/v1/messages/conversations
//! - GET  /api/v1/messages/thread/{other_id}?property_id=N
//! - POST /api/v1/messages

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::message::{ConversationSummary, Message};
use crate::services::MessageServiceError;

#[derive(Debug, Deserialize)]
pub struct ThreadQuery {
    pub property_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub recipient_id: i64,
    pub property_id: Option<i64>,
    pub content: String,
}

impl From<MessageServiceError> for ApiError {
    fn from(e: MessageServiceError) -> Self {
        match e {
            MessageServiceError::Validation(msg) => ApiError::validation_error(msg),
            MessageServiceError::RecipientNotFound => ApiError::not_found("Recipient not found"),
            MessageServiceError::Internal(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(send_message))
        .route("/conversations", get(list_conversations))
        .route("/thread/{other_id}", get(get_thread))
}

/// GET /api/v1/messages/conversations
async fn list_conversations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    Ok(Json(state.message_service.conversations(user.0.id).await?))
}

/// GET /api/v1/messages/thread/{other_id} - Also marks incoming messages read
async fn get_thread(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(other_id): Path<i64>,
    Query(query): Query<ThreadQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(
        state
            .message_service
            .thread(user.0.id, other_id, query.property_id)
            .await?,
    ))
}

/// POST /api/v1/messages
async fn send_message(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<SendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state
        .message_service
        .send(user.0.id, body.recipient_id, body.property_id, &body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
