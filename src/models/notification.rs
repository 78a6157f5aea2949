//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An in-app notification delivered to one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub kind: NotificationKind,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// What triggered the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ApplicationAccepted,
    ApplicationRejected,
    ContractCreated,
    VisitConfirmed,
    VisitCancelled,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::ApplicationAccepted => write!(f, "application_accepted"),
            NotificationKind::ApplicationRejected => write!(f, "application_rejected"),
            NotificationKind::ContractCreated => write!(f, "contract_created"),
            NotificationKind::VisitConfirmed => write!(f, "visit_confirmed"),
            NotificationKind::VisitCancelled => write!(f, "visit_cancelled"),
        }
    }
}

impl FromStr for NotificationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "application_accepted" => Ok(NotificationKind::ApplicationAccepted),
            "application_rejected" => Ok(NotificationKind::ApplicationRejected),
            "contract_created" => Ok(NotificationKind::ContractCreated),
            "visit_confirmed" => Ok(NotificationKind::VisitConfirmed),
            "visit_cancelled" => Ok(NotificationKind::VisitCancelled),
            _ => Err(anyhow::anyhow!("Invalid notification kind: {}", s)),
        }
    }
}
