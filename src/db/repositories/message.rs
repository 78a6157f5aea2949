//! Message repository
//!
//! Threads are keyed by (counterpart, optional listing). The inbox view is
//! folded from the newest-first message stream rather than a window
//! function, which keeps the SQL portable and the unread math in one place.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::HashSet;
use std::sync::Arc;

use crate::db::{BindValue, QueryExecutor};
use crate::models::{ConversationSummary, Message};

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Inbox: one row per (counterpart, listing) with the latest message and
    /// the number of unread incoming messages
    async fn conversations(&self, user_id: i64) -> Result<Vec<ConversationSummary>>;

    /// Full thread between two users, oldest first
    async fn thread(
        &self,
        user_id: i64,
        other_id: i64,
        property_id: Option<i64>,
    ) -> Result<Vec<Message>>;

    async fn create(
        &self,
        sender_id: i64,
        recipient_id: i64,
        property_id: Option<i64>,
        content: &str,
    ) -> Result<Message>;

    /// Mark every message from `other_id` to `user_id` in the thread as
    /// read; returns how many changed
    async fn mark_thread_read(
        &self,
        user_id: i64,
        other_id: i64,
        property_id: Option<i64>,
    ) -> Result<u64>;
}

pub struct SqlxMessageRepository {
    executor: QueryExecutor,
}

impl SqlxMessageRepository {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    pub fn shared(executor: QueryExecutor) -> Arc<dyn MessageRepository> {
        Arc::new(Self::new(executor))
    }
}

#[async_trait]
impl MessageRepository for SqlxMessageRepository {
    async fn conversations(&self, user_id: i64) -> Result<Vec<ConversationSummary>> {
        let rows = self
            .executor
            .fetch_all(
                r#"
                SELECT m.id, m.sender_id, m.recipient_id, m.property_id, m.content,
                       m.is_read, m.created_at,
                       CASE WHEN m.sender_id = ? THEN m.recipient_id ELSE m.sender_id END as counterpart_id,
                       u.name as counterpart_name,
                       p.title as property_title
                FROM messages m
                JOIN users u ON u.id = CASE WHEN m.sender_id = ? THEN m.recipient_id ELSE m.sender_id END
                LEFT JOIN properties p ON p.id = m.property_id
                WHERE m.sender_id = ? OR m.recipient_id = ?
                ORDER BY m.created_at DESC, m.id DESC
                "#,
                &[user_id.into(), user_id.into(), user_id.into(), user_id.into()],
            )
            .await
            .context("Failed to load conversations")?;

        // Newest message per thread wins; later rows only bump unread counts
        let mut summaries: Vec<ConversationSummary> = Vec::new();
        let mut seen: HashSet<(i64, Option<i64>)> = HashSet::new();

        for row in &rows {
            let counterpart_id: i64 = row.get("counterpart_id");
            let property_id: Option<i64> = row.get("property_id");
            let incoming_unread =
                row.get::<i64, _>("recipient_id") == user_id && !row.get::<bool, _>("is_read");

            let key = (counterpart_id, property_id);
            if seen.insert(key) {
                summaries.push(ConversationSummary {
                    counterpart_id,
                    counterpart_name: row.get("counterpart_name"),
                    property_id,
                    property_title: row.get("property_title"),
                    last_message: row.get("content"),
                    last_message_at: row.get("created_at"),
                    unread_count: i64::from(incoming_unread),
                });
            } else if incoming_unread {
                if let Some(summary) = summaries
                    .iter_mut()
                    .find(|s| (s.counterpart_id, s.property_id) == key)
                {
                    summary.unread_count += 1;
                }
            }
        }

        Ok(summaries)
    }

    async fn thread(
        &self,
        user_id: i64,
        other_id: i64,
        property_id: Option<i64>,
    ) -> Result<Vec<Message>> {
        let mut sql = String::from(
            r#"
            SELECT id, sender_id, recipient_id, property_id, content, is_read, created_at
            FROM messages
            WHERE ((sender_id = ? AND recipient_id = ?) OR (sender_id = ? AND recipient_id = ?))
            "#,
        );
        let mut params: Vec<BindValue> = vec![
            user_id.into(),
            other_id.into(),
            other_id.into(),
            user_id.into(),
        ];
        if let Some(property_id) = property_id {
            sql.push_str(" AND property_id = ?");
            params.push(property_id.into());
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC");

        let rows = self
            .executor
            .fetch_all(&sql, &params)
            .await
            .context("Failed to load thread")?;

        Ok(rows.iter().map(row_to_message).collect())
    }

    async fn create(
        &self,
        sender_id: i64,
        recipient_id: i64,
        property_id: Option<i64>,
        content: &str,
    ) -> Result<Message> {
        let now = Utc::now();
        let result = self
            .executor
            .execute(
                r#"
                INSERT INTO messages (sender_id, recipient_id, property_id, content, is_read, created_at)
                VALUES (?, ?, ?, ?, 0, ?)
                "#,
                &[
                    sender_id.into(),
                    recipient_id.into(),
                    property_id.into(),
                    content.into(),
                    now.into(),
                ],
            )
            .await
            .context("Failed to create message")?;

        Ok(Message {
            id: result.last_insert_id,
            sender_id,
            recipient_id,
            property_id,
            content: content.to_string(),
            is_read: false,
            created_at: now,
        })
    }

    async fn mark_thread_read(
        &self,
        user_id: i64,
        other_id: i64,
        property_id: Option<i64>,
    ) -> Result<u64> {
        let mut sql = String::from(
            "UPDATE messages SET is_read = 1 WHERE recipient_id = ? AND sender_id = ? AND is_read = 0",
        );
        let mut params: Vec<BindValue> = vec![user_id.into(), other_id.into()];
        if let Some(property_id) = property_id {
            sql.push_str(" AND property_id = ?");
            params.push(property_id.into());
        }

        let result = self
            .executor
            .execute(&sql, &params)
            .await
            .context("Failed to mark thread read")?;
        Ok(result.rows_affected)
    }
}

fn row_to_message(row: &SqliteRow) -> Message {
    Message {
        id: row.get("id"),
        sender_id: row.get("sender_id"),
        recipient_id: row.get("recipient_id"),
        property_id: row.get("property_id"),
        content: row.get("content"),
        is_read: row.get("is_read"),
        created_at: row.get("created_at"),
    }
}
