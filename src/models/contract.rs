//! Rental contract model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: i64,
    pub property_id: i64,
    pub owner_id: i64,
    pub tenant_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_rent: f64,
    pub status: ContractStatus,
    pub document_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A contract joined with listing title and both party names.
#[derive(Debug, Clone, Serialize)]
pub struct ContractWithDetails {
    #[serde(flatten)]
    pub contract: Contract,
    pub property_title: String,
    pub owner_name: String,
    pub tenant_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Active,
    Finished,
    Terminated,
}

impl Default for ContractStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractStatus::Active => write!(f, "active"),
            ContractStatus::Finished => write!(f, "finished"),
            ContractStatus::Terminated => write!(f, "terminated"),
        }
    }
}

impl FromStr for ContractStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(ContractStatus::Active),
            "finished" => Ok(ContractStatus::Finished),
            "terminated" => Ok(ContractStatus::Terminated),
            _ => Err(anyhow::anyhow!("Invalid contract status: {}", s)),
        }
    }
}

/// Input for creating a contract
#[derive(Debug, Clone)]
pub struct CreateContractInput {
    pub property_id: i64,
    pub tenant_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_rent: f64,
    pub document_url: Option<String>,
}
