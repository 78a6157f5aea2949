//! Visit model
//!
//! Scheduled viewings between a tenant and a property owner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub id: i64,
    pub property_id: i64,
    pub tenant_id: i64,
    pub owner_id: i64,
    pub scheduled_at: DateTime<Utc>,
    pub status: VisitStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A visit joined with listing title and counterpart contact info.
#[derive(Debug, Clone, Serialize)]
pub struct VisitWithDetails {
    #[serde(flatten)]
    pub visit: Visit,
    pub property_title: String,
    pub property_address: String,
    /// The other party's name (owner for tenants, tenant for owners)
    pub counterpart_name: String,
    pub counterpart_phone: Option<String>,
}

/// Lifecycle of a visit; only the property owner moves it past Pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl Default for VisitStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisitStatus::Pending => write!(f, "pending"),
            VisitStatus::Confirmed => write!(f, "confirmed"),
            VisitStatus::Cancelled => write!(f, "cancelled"),
            VisitStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for VisitStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(VisitStatus::Pending),
            "confirmed" => Ok(VisitStatus::Confirmed),
            "cancelled" => Ok(VisitStatus::Cancelled),
            "completed" => Ok(VisitStatus::Completed),
            _ => Err(anyhow::anyhow!("Invalid visit status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_status_round_trip() {
        for s in [
            VisitStatus::Pending,
            VisitStatus::Confirmed,
            VisitStatus::Cancelled,
            VisitStatus::Completed,
        ] {
            assert_eq!(VisitStatus::from_str(&s.to_string()).unwrap(), s);
        }
        assert!(VisitStatus::from_str("rescheduled").is_err());
    }
}
