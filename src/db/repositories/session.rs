//! Session repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::sync::Arc;

use crate::db::QueryExecutor;
use crate::models::Session;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<()>;

    async fn get(&self, id: &str) -> Result<Option<Session>>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Remove all sessions past their expiry, returning how many went away
    async fn delete_expired(&self) -> Result<u64>;
}

pub struct SqlxSessionRepository {
    executor: QueryExecutor,
}

impl SqlxSessionRepository {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    pub fn shared(executor: QueryExecutor) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(executor))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<()> {
        self.executor
            .execute(
                "INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
                &[
                    session.id.as_str().into(),
                    session.user_id.into(),
                    session.expires_at.into(),
                    session.created_at.into(),
                ],
            )
            .await
            .context("Failed to create session")?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        let row = self
            .executor
            .fetch_optional(
                "SELECT id, user_id, expires_at, created_at FROM sessions WHERE id = ?",
                &[id.into()],
            )
            .await
            .context("Failed to get session")?;

        Ok(row.map(|row| row_to_session(&row)))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.executor
            .execute("DELETE FROM sessions WHERE id = ?", &[id.into()])
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64> {
        let result = self
            .executor
            .execute(
                "DELETE FROM sessions WHERE expires_at <= ?",
                &[Utc::now().into()],
            )
            .await
            .context("Failed to delete expired sessions")?;
        Ok(result.rows_affected)
    }
}

fn row_to_session(row: &SqliteRow) -> Session {
    Session {
        id: row.get("id"),
        user_id: row.get("user_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }
}
