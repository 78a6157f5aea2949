//! Property API endpoints
//!
//! - GET    /api/v1/properties           (public search)
//! - GET    /api/v1/properties/{id}      (public detail with owner contact)
//! - GET    /api/v1/properties/mine      (owner's own listings)
//! - POST   /api/v1/properties
//! - PUT    /api/v1/properties/{id}
//! - DELETE /api/v1/properties/{id}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::Paginated;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    CreatePropertyInput, Operation, Property, PropertyFilter, PropertySort, PropertyType,
    PropertyWithOwner, UpdatePropertyInput,
};
use crate::services::PropertyServiceError;

/// Query parameters for property search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub property_type: Option<PropertyType>,
    pub operation: Option<Operation>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_bedrooms: Option<i64>,
    pub min_bathrooms: Option<i64>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    pub location: Option<String>,
    #[serde(default)]
    pub sort: PropertySort,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl From<SearchQuery> for PropertyFilter {
    fn from(q: SearchQuery) -> Self {
        Self {
            property_type: q.property_type,
            operation: q.operation,
            min_price: q.min_price,
            max_price: q.max_price,
            min_bedrooms: q.min_bedrooms,
            min_bathrooms: q.min_bathrooms,
            min_area: q.min_area,
            max_area: q.max_area,
            location: q.location.filter(|l| !l.trim().is_empty()),
            sort: q.sort,
            limit: q.limit,
            offset: q.offset,
        }
    }
}

/// Request body for creating a listing
#[derive(Debug, Deserialize)]
pub struct CreatePropertyRequest {
    pub title: String,
    pub description: Option<String>,
    pub property_type: PropertyType,
    #[serde(default)]
    pub operation: Operation,
    pub price: f64,
    pub currency: Option<String>,
    pub address: String,
    pub commune: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    #[serde(default)]
    pub bedrooms: i64,
    #[serde(default)]
    pub bathrooms: i64,
    pub area_m2: Option<f64>,
    pub image_url: Option<String>,
}

/// Request body for updating a listing
#[derive(Debug, Deserialize)]
pub struct UpdatePropertyRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub address: Option<String>,
    pub commune: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub area_m2: Option<f64>,
    pub image_url: Option<String>,
}

impl From<PropertyServiceError> for ApiError {
    fn from(e: PropertyServiceError) -> Self {
        match e {
            PropertyServiceError::Validation(msg) => ApiError::validation_error(msg),
            PropertyServiceError::NotFound => ApiError::not_found("Listing not found"),
            PropertyServiceError::Forbidden => {
                ApiError::forbidden("Not allowed to modify this listing")
            }
            PropertyServiceError::Internal(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

/// Build public property routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(search_properties))
        .route("/{id}", get(get_property))
}

/// Build protected property routes
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_property))
        .route("/mine", get(list_my_properties))
        .route("/{id}", put(update_property).delete(delete_property))
}

/// GET /api/v1/properties - Search published listings
async fn search_properties(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Paginated<Property>>, ApiError> {
    let filter: PropertyFilter = query.into();
    let (limit, offset) = (filter.limit, filter.offset);
    let (items, total) = state.property_service.search(filter).await?;

    // Echo back the effective paging so clients can page consistently
    let per_page = if limit <= 0 { items.len() as i64 } else { limit };
    let page = if per_page > 0 { offset / per_page.max(1) + 1 } else { 1 };
    Ok(Json(Paginated::new(items, total, page, per_page)))
}

/// GET /api/v1/properties/{id}
async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PropertyWithOwner>, ApiError> {
    Ok(Json(state.property_service.get(id).await?))
}

/// GET /api/v1/properties/mine
async fn list_my_properties(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Property>>, ApiError> {
    Ok(Json(state.property_service.list_mine(user.0.id).await?))
}

/// POST /api/v1/properties
async fn create_property(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreatePropertyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreatePropertyInput {
        title: body.title,
        description: body.description,
        property_type: body.property_type,
        operation: body.operation,
        price: body.price,
        currency: body.currency,
        address: body.address,
        commune: body.commune,
        city: body.city,
        region: body.region,
        bedrooms: body.bedrooms,
        bathrooms: body.bathrooms,
        area_m2: body.area_m2,
        image_url: body.image_url,
    };

    let property = state.property_service.create(&user.0, input).await?;
    Ok((StatusCode::CREATED, Json(property)))
}

/// PUT /api/v1/properties/{id}
async fn update_property(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePropertyRequest>,
) -> Result<Json<Property>, ApiError> {
    let input = UpdatePropertyInput {
        title: body.title,
        description: body.description,
        price: body.price,
        address: body.address,
        commune: body.commune,
        city: body.city,
        region: body.region,
        bedrooms: body.bedrooms,
        bathrooms: body.bathrooms,
        area_m2: body.area_m2,
        image_url: body.image_url,
    };

    Ok(Json(state.property_service.update(&user.0, id, input).await?))
}

/// DELETE /api/v1/properties/{id}
async fn delete_property(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.property_service.delete(&user.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
