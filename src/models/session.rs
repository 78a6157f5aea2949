//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An opaque bearer-token session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session token, sent as `Authorization: Bearer <id>`
    pub id: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a session valid for `ttl_hours` from now.
    pub fn new(user_id: i64, ttl_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().simple().to_string(),
            user_id,
            expires_at: now + Duration::hours(ttl_hours),
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_not_expired() {
        let session = Session::new(1, 24);
        assert!(!session.is_expired());
        assert_eq!(session.user_id, 1);
        assert_eq!(session.id.len(), 32);
    }

    #[test]
    fn test_expired_session() {
        let mut session = Session::new(1, 24);
        session.expires_at = Utc::now() - Duration::hours(1);
        assert!(session.is_expired());
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = Session::new(1, 24);
        let b = Session::new(1, 24);
        assert_ne!(a.id, b.id);
    }
}
