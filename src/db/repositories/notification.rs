//! Notification repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

use crate::db::{BindValue, QueryExecutor};
use crate::models::{Notification, NotificationKind};

/// Hard cap on the notification feed.
const MAX_FEED: i64 = 100;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Newest first, capped; `unread_only` narrows to unread
    async fn list_for_user(&self, user_id: i64, unread_only: bool) -> Result<Vec<Notification>>;

    async fn create(
        &self,
        user_id: i64,
        kind: NotificationKind,
        body: &str,
    ) -> Result<Notification>;

    /// Mark one notification read, scoped to its owner; false when nothing
    /// matched
    async fn mark_read(&self, id: i64, user_id: i64) -> Result<bool>;

    /// Mark everything read; returns how many changed
    async fn mark_all_read(&self, user_id: i64) -> Result<u64>;
}

pub struct SqlxNotificationRepository {
    executor: QueryExecutor,
}

impl SqlxNotificationRepository {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    pub fn shared(executor: QueryExecutor) -> Arc<dyn NotificationRepository> {
        Arc::new(Self::new(executor))
    }
}

#[async_trait]
impl NotificationRepository for SqlxNotificationRepository {
    async fn list_for_user(&self, user_id: i64, unread_only: bool) -> Result<Vec<Notification>> {
        let mut sql = String::from(
            "SELECT id, user_id, kind, body, is_read, created_at FROM notifications WHERE user_id = ?",
        );
        let mut params: Vec<BindValue> = vec![user_id.into()];
        if unread_only {
            sql.push_str(" AND is_read = 0");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ?");
        params.push(MAX_FEED.into());

        let rows = self
            .executor
            .fetch_all(&sql, &params)
            .await
            .context("Failed to list notifications")?;

        rows.iter().map(row_to_notification).collect()
    }

    async fn create(
        &self,
        user_id: i64,
        kind: NotificationKind,
        body: &str,
    ) -> Result<Notification> {
        let now = Utc::now();
        let result = self
            .executor
            .execute(
                "INSERT INTO notifications (user_id, kind, body, is_read, created_at) VALUES (?, ?, ?, 0, ?)",
                &[
                    user_id.into(),
                    kind.to_string().into(),
                    body.into(),
                    now.into(),
                ],
            )
            .await
            .context("Failed to create notification")?;

        Ok(Notification {
            id: result.last_insert_id,
            user_id,
            kind,
            body: body.to_string(),
            is_read: false,
            created_at: now,
        })
    }

    async fn mark_read(&self, id: i64, user_id: i64) -> Result<bool> {
        let result = self
            .executor
            .execute(
                "UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?",
                &[id.into(), user_id.into()],
            )
            .await
            .context("Failed to mark notification read")?;
        Ok(result.rows_affected > 0)
    }

    async fn mark_all_read(&self, user_id: i64) -> Result<u64> {
        let result = self
            .executor
            .execute(
                "UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0",
                &[user_id.into()],
            )
            .await
            .context("Failed to mark notifications read")?;
        Ok(result.rows_affected)
    }
}

fn row_to_notification(row: &SqliteRow) -> Result<Notification> {
    let kind_str: String = row.get("kind");
    Ok(Notification {
        id: row.get("id"),
        user_id: row.get("user_id"),
        kind: NotificationKind::from_str(&kind_str)
            .with_context(|| format!("Invalid notification kind in database: {}", kind_str))?,
        body: row.get("body"),
        is_read: row.get("is_read"),
        created_at: row.get("created_at"),
    })
}
