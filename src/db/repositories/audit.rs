//! Audit log repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::sync::Arc;

use crate::db::QueryExecutor;
use crate::models::AuditEntry;

#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Append one entry
    async fn record(
        &self,
        user_id: Option<i64>,
        action: &str,
        entity: &str,
        entity_id: Option<i64>,
        detail: Option<&str>,
    ) -> Result<()>;

    /// Most recent entries, newest first
    async fn list_recent(&self, limit: i64) -> Result<Vec<AuditEntry>>;
}

pub struct SqlxAuditRepository {
    executor: QueryExecutor,
}

impl SqlxAuditRepository {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    pub fn shared(executor: QueryExecutor) -> Arc<dyn AuditRepository> {
        Arc::new(Self::new(executor))
    }
}

#[async_trait]
impl AuditRepository for SqlxAuditRepository {
    async fn record(
        &self,
        user_id: Option<i64>,
        action: &str,
        entity: &str,
        entity_id: Option<i64>,
        detail: Option<&str>,
    ) -> Result<()> {
        self.executor
            .execute(
                "INSERT INTO audit_log (user_id, action, entity, entity_id, detail, created_at) VALUES (?, ?, ?, ?, ?, ?)",
                &[
                    user_id.into(),
                    action.into(),
                    entity.into(),
                    entity_id.into(),
                    detail.map(str::to_string).into(),
                    Utc::now().into(),
                ],
            )
            .await
            .context("Failed to record audit entry")?;
        Ok(())
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<AuditEntry>> {
        let rows = self
            .executor
            .fetch_all(
                "SELECT id, user_id, action, entity, entity_id, detail, created_at FROM audit_log ORDER BY created_at DESC, id DESC LIMIT ?",
                &[limit.into()],
            )
            .await
            .context("Failed to list audit log")?;

        Ok(rows.iter().map(row_to_entry).collect())
    }
}

fn row_to_entry(row: &SqliteRow) -> AuditEntry {
    AuditEntry {
        id: row.get("id"),
        user_id: row.get("user_id"),
        action: row.get("action"),
        entity: row.get("entity"),
        entity_id: row.get("entity_id"),
        detail: row.get("detail"),
        created_at: row.get("created_at"),
    }
}
