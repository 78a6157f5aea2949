//! Favorite model

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::property::{Operation, PropertyStatus, PropertyType};

/// A user's saved listing.
#[derive(Debug, Clone, Serialize)]
pub struct Favorite {
    pub id: i64,
    pub user_id: i64,
    pub property_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A favorite joined with a summary of the listing it points at.
#[derive(Debug, Clone, Serialize)]
pub struct FavoriteWithProperty {
    pub id: i64,
    pub property_id: i64,
    pub title: String,
    pub property_type: PropertyType,
    pub operation: Operation,
    pub price: f64,
    pub currency: String,
    pub address: String,
    pub thumbnail_url: Option<String>,
    pub status: PropertyStatus,
    pub favorited_at: DateTime<Utc>,
}
