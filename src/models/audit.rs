//! Audit log model

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One admin/moderation action recorded for traceability.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<i64>,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}
