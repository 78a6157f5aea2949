//! Messaging service
//!
//! Direct messages between users, optionally tied to a listing. Reading a
//! thread marks the incoming half of it as read.

use anyhow::Result;
use std::sync::Arc;

use crate::db::repositories::{MessageRepository, UserRepository};
use crate::models::message::{ConversationSummary, Message};

const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Debug, thiserror::Error)]
pub enum MessageServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Recipient not found")]
    RecipientNotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct MessageService {
    message_repo: Arc<dyn MessageRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl MessageService {
    pub fn new(
        message_repo: Arc<dyn MessageRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            message_repo,
            user_repo,
        }
    }

    pub async fn conversations(
        &self,
        user_id: i64,
    ) -> Result<Vec<ConversationSummary>, MessageServiceError> {
        Ok(self.message_repo.conversations(user_id).await?)
    }

    /// Fetch a thread and mark the messages addressed to the reader as read.
    pub async fn thread(
        &self,
        user_id: i64,
        other_id: i64,
        property_id: Option<i64>,
    ) -> Result<Vec<Message>, MessageServiceError> {
        let messages = self
            .message_repo
            .thread(user_id, other_id, property_id)
            .await?;
        self.message_repo
            .mark_thread_read(user_id, other_id, property_id)
            .await?;
        Ok(messages)
    }

    pub async fn send(
        &self,
        sender_id: i64,
        recipient_id: i64,
        property_id: Option<i64>,
        content: &str,
    ) -> Result<Message, MessageServiceError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(MessageServiceError::Validation(
                "Message cannot be empty".into(),
            ));
        }
        if content.len() > MAX_MESSAGE_LEN {
            return Err(MessageServiceError::Validation(
                "Message is too long".into(),
            ));
        }
        if sender_id == recipient_id {
            return Err(MessageServiceError::Validation(
                "Cannot message yourself".into(),
            ));
        }

        let recipient = self
            .user_repo
            .get_by_id(recipient_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(MessageServiceError::RecipientNotFound)?;

        Ok(self
            .message_repo
            .create(sender_id, recipient.id, property_id, content)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seed_property, seed_user, setup_executor};
    use crate::db::repositories::{SqlxMessageRepository, SqlxUserRepository};
    use crate::db::QueryExecutor;
    use crate::models::UserRole;

    fn service(executor: &QueryExecutor) -> MessageService {
        MessageService::new(
            SqlxMessageRepository::shared(executor.clone()),
            SqlxUserRepository::shared(executor.clone()),
        )
    }

    #[tokio::test]
    async fn test_send_and_read_thread() {
        let executor = setup_executor().await;
        let a = seed_user(&executor, "a@example.com", UserRole::Tenant).await;
        let b = seed_user(&executor, "b@example.com", UserRole::Owner).await;
        let service = service(&executor);

        service
            .send(a.id, b.id, None, "Hola, ¿sigue disponible?")
            .await
            .expect("send");
        service
            .send(b.id, a.id, None, "Sí, puedes visitarla el sábado")
            .await
            .expect("reply");

        let thread = service.thread(a.id, b.id, None).await.expect("thread");
        assert_eq!(thread.len(), 2);

        // Reading the thread cleared the unread count on a's side
        let conversations = service.conversations(a.id).await.expect("conversations");
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].unread_count, 0);
    }

    #[tokio::test]
    async fn test_send_validation() {
        let executor = setup_executor().await;
        let a = seed_user(&executor, "a@example.com", UserRole::Tenant).await;
        let b = seed_user(&executor, "b@example.com", UserRole::Owner).await;
        let service = service(&executor);

        assert!(matches!(
            service.send(a.id, b.id, None, "   ").await,
            Err(MessageServiceError::Validation(_))
        ));
        assert!(matches!(
            service.send(a.id, a.id, None, "hola").await,
            Err(MessageServiceError::Validation(_))
        ));
        assert!(matches!(
            service.send(a.id, b.id, None, &"x".repeat(MAX_MESSAGE_LEN + 1)).await,
            Err(MessageServiceError::Validation(_))
        ));
        assert!(matches!(
            service.send(a.id, 9999, None, "hola").await,
            Err(MessageServiceError::RecipientNotFound)
        ));
    }

    #[tokio::test]
    async fn test_thread_scoped_to_listing() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let service = service(&executor);

        service
            .send(tenant.id, owner.id, Some(property_id), "Por el depto")
            .await
            .expect("send");
        service
            .send(tenant.id, owner.id, None, "Otra cosa")
            .await
            .expect("send");

        let scoped = service
            .thread(tenant.id, owner.id, Some(property_id))
            .await
            .expect("thread");
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].content, "Por el depto");
    }
}
