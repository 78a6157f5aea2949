//! Tenant passport model
//!
//! The passport is a per-tenant document checklist. Each of the four
//! document kinds contributes 25% to the progress score; the passport is
//! completed at 100%.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passport {
    pub id: i64,
    pub user_id: i64,
    pub has_identity: bool,
    pub has_solvency: bool,
    pub has_income: bool,
    pub has_other: bool,
    /// 0..=100, in steps of 25
    pub progress: i64,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Passport {
    /// Progress implied by the current document flags.
    pub fn computed_progress(&self) -> i64 {
        [self.has_identity, self.has_solvency, self.has_income, self.has_other]
            .iter()
            .filter(|&&flag| flag)
            .count() as i64
            * 25
    }
}

/// An uploaded document attached to a passport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassportDocument {
    pub id: i64,
    pub passport_id: i64,
    pub kind: DocumentKind,
    pub file_url: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// National ID or passport scan
    Identity,
    /// Credit/solvency report
    Solvency,
    /// Proof of income
    Income,
    /// Anything else supporting the file
    Other,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Identity => write!(f, "identity"),
            DocumentKind::Solvency => write!(f, "solvency"),
            DocumentKind::Income => write!(f, "income"),
            DocumentKind::Other => write!(f, "other"),
        }
    }
}

impl FromStr for DocumentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "identity" => Ok(DocumentKind::Identity),
            "solvency" => Ok(DocumentKind::Solvency),
            "income" => Ok(DocumentKind::Income),
            "other" => Ok(DocumentKind::Other),
            _ => Err(anyhow::anyhow!("Invalid document kind: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_passport() -> Passport {
        Passport {
            id: 1,
            user_id: 1,
            has_identity: false,
            has_solvency: false,
            has_income: false,
            has_other: false,
            progress: 0,
            completed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_progress_steps_of_25() {
        let mut passport = empty_passport();
        assert_eq!(passport.computed_progress(), 0);

        passport.has_identity = true;
        assert_eq!(passport.computed_progress(), 25);

        passport.has_solvency = true;
        passport.has_income = true;
        assert_eq!(passport.computed_progress(), 75);

        passport.has_other = true;
        assert_eq!(passport.computed_progress(), 100);
    }

    #[test]
    fn test_document_kind_round_trip() {
        for k in [
            DocumentKind::Identity,
            DocumentKind::Solvency,
            DocumentKind::Income,
            DocumentKind::Other,
        ] {
            assert_eq!(DocumentKind::from_str(&k.to_string()).unwrap(), k);
        }
        assert!(DocumentKind::from_str("selfie").is_err());
    }
}
