//! Contract API endpoints
//!
//! - GET  /api/v1/contracts?role=tenant|owner
//! - POST /api/v1/contracts

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::visits::PartyRole;
use crate::models::contract::{ContractWithDetails, CreateContractInput};
use crate::services::ContractServiceError;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub role: PartyRole,
}

#[derive(Debug, Deserialize)]
pub struct CreateContractRequest {
    pub property_id: i64,
    pub tenant_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_rent: f64,
    pub document_url: Option<String>,
}

impl From<ContractServiceError> for ApiError {
    fn from(e: ContractServiceError) -> Self {
        match e {
            ContractServiceError::Validation(msg) => ApiError::validation_error(msg),
            ContractServiceError::PropertyNotFound => ApiError::not_found("Listing not found"),
            ContractServiceError::TenantNotFound => ApiError::not_found("Tenant not found"),
            ContractServiceError::Forbidden => {
                ApiError::forbidden("Not allowed to create a contract for this listing")
            }
            ContractServiceError::Internal(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_contracts).post(create_contract))
}

/// GET /api/v1/contracts
async fn list_contracts(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ContractWithDetails>>, ApiError> {
    let contracts = match query.role {
        PartyRole::Tenant => state.contract_service.list_as_tenant(user.0.id).await?,
        PartyRole::Owner => state.contract_service.list_as_owner(user.0.id).await?,
    };
    Ok(Json(contracts))
}

/// POST /api/v1/contracts
async fn create_contract(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateContractRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateContractInput {
        property_id: body.property_id,
        tenant_id: body.tenant_id,
        start_date: body.start_date,
        end_date: body.end_date,
        monthly_rent: body.monthly_rent,
        document_url: body.document_url,
    };

    let contract = state.contract_service.create(&user.0, input).await?;
    Ok((StatusCode::CREATED, Json(contract)))
}
