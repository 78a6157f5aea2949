//! Property model
//!
//! Listings plus the filter/sort types used by property search. Sorting is
//! a closed enum so user input can never reach the ORDER BY clause as raw
//! text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A property listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub property_type: PropertyType,
    pub operation: Operation,
    pub price: f64,
    pub currency: String,
    pub address: String,
    pub commune: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub bedrooms: i64,
    pub bathrooms: i64,
    pub area_m2: Option<f64>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub status: PropertyStatus,
    /// Soft-delete flag; inactive listings never appear in search
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A listing joined with its owner's contact info, returned by detail
/// lookups so tenants can reach out.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyWithOwner {
    #[serde(flatten)]
    pub property: Property,
    pub owner_name: String,
    pub owner_email: String,
    pub owner_phone: Option<String>,
}

/// Kind of dwelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Apartment,
    House,
    Studio,
    Room,
    Office,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::Apartment => write!(f, "apartment"),
            PropertyType::House => write!(f, "house"),
            PropertyType::Studio => write!(f, "studio"),
            PropertyType::Room => write!(f, "room"),
            PropertyType::Office => write!(f, "office"),
        }
    }
}

impl FromStr for PropertyType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "apartment" => Ok(PropertyType::Apartment),
            "house" => Ok(PropertyType::House),
            "studio" => Ok(PropertyType::Studio),
            "room" => Ok(PropertyType::Room),
            "office" => Ok(PropertyType::Office),
            _ => Err(anyhow::anyhow!("Invalid property type: {}", s)),
        }
    }
}

/// Listing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Rent,
    Sale,
}

impl Default for Operation {
    fn default() -> Self {
        Self::Rent
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Rent => write!(f, "rent"),
            Operation::Sale => write!(f, "sale"),
        }
    }
}

impl FromStr for Operation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rent" => Ok(Operation::Rent),
            "sale" => Ok(Operation::Sale),
            _ => Err(anyhow::anyhow!("Invalid operation: {}", s)),
        }
    }
}

/// Moderation state of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    /// Awaiting admin review
    Pending,
    /// Publicly visible in search
    Published,
    /// Rejected by moderation
    Rejected,
}

impl Default for PropertyStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyStatus::Pending => write!(f, "pending"),
            PropertyStatus::Published => write!(f, "published"),
            PropertyStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for PropertyStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PropertyStatus::Pending),
            "published" => Ok(PropertyStatus::Published),
            "rejected" => Ok(PropertyStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid property status: {}", s)),
        }
    }
}

/// Search ordering. Every variant maps to a fixed ORDER BY clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertySort {
    Recent,
    PriceAsc,
    PriceDesc,
    AreaDesc,
}

impl Default for PropertySort {
    fn default() -> Self {
        Self::Recent
    }
}

impl PropertySort {
    /// The ORDER BY clause for this sort.
    pub fn order_clause(&self) -> &'static str {
        match self {
            PropertySort::Recent => "p.created_at DESC",
            PropertySort::PriceAsc => "p.price ASC",
            PropertySort::PriceDesc => "p.price DESC",
            PropertySort::AreaDesc => "p.area_m2 DESC",
        }
    }
}

impl FromStr for PropertySort {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recent" => Ok(PropertySort::Recent),
            "price_asc" => Ok(PropertySort::PriceAsc),
            "price_desc" => Ok(PropertySort::PriceDesc),
            "area_desc" => Ok(PropertySort::AreaDesc),
            _ => Err(anyhow::anyhow!("Invalid sort: {}", s)),
        }
    }
}

/// Search filter. All criteria are optional and combine with AND.
#[derive(Debug, Clone, Default)]
pub struct PropertyFilter {
    pub property_type: Option<PropertyType>,
    pub operation: Option<Operation>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_bedrooms: Option<i64>,
    pub min_bathrooms: Option<i64>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    /// Substring match against address, commune and city
    pub location: Option<String>,
    pub sort: PropertySort,
    pub limit: i64,
    pub offset: i64,
}

/// Input for creating a listing
#[derive(Debug, Clone)]
pub struct CreatePropertyInput {
    pub title: String,
    pub description: Option<String>,
    pub property_type: PropertyType,
    pub operation: Operation,
    pub price: f64,
    pub currency: Option<String>,
    pub address: String,
    pub commune: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub bedrooms: i64,
    pub bathrooms: i64,
    pub area_m2: Option<f64>,
    pub image_url: Option<String>,
}

/// Partial update for a listing; None leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct UpdatePropertyInput {
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
