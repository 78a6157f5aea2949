//! Messaging model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A direct message between two users, optionally tied to a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub property_id: Option<i64>,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// One row of the inbox view: the latest message exchanged with a
/// counterpart (per listing) plus the unread count.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub counterpart_id: i64,
    pub counterpart_name: String,
    pub property_id: Option<i64>,
    pub property_title: Option<String>,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: i64,
}
