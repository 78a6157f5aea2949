//! Notification service

use anyhow::Result;
use std::sync::Arc;

use crate::db::repositories::NotificationRepository;
use crate::models::Notification;

#[derive(Debug, thiserror::Error)]
pub enum NotificationServiceError {
    #[error("Notification not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct NotificationService {
    notification_repo: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(notification_repo: Arc<dyn NotificationRepository>) -> Self {
        Self { notification_repo }
    }

    pub async fn list(
        &self,
        user_id: i64,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationServiceError> {
        Ok(self
            .notification_repo
            .list_for_user(user_id, unread_only)
            .await?)
    }

    /// Mark one notification read; ownership is enforced by the query.
    pub async fn mark_read(
        &self,
        user_id: i64,
        notification_id: i64,
    ) -> Result<(), NotificationServiceError> {
        if !self
            .notification_repo
            .mark_read(notification_id, user_id)
            .await?
        {
            return Err(NotificationServiceError::NotFound);
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: i64) -> Result<u64, NotificationServiceError> {
        Ok(self.notification_repo.mark_all_read(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seed_user, setup_executor};
    use crate::db::repositories::{NotificationRepository as _, SqlxNotificationRepository};
    use crate::models::{NotificationKind, UserRole};

    #[tokio::test]
    async fn test_mark_read_scoped() {
        let executor = setup_executor().await;
        let user = seed_user(&executor, "u@example.com", UserRole::Tenant).await;
        let other = seed_user(&executor, "x@example.com", UserRole::Tenant).await;
        let repo = SqlxNotificationRepository::new(executor.clone());
        let service = NotificationService::new(SqlxNotificationRepository::shared(executor));

        let notification = repo
            .create(user.id, NotificationKind::VisitConfirmed, "Visita confirmada")
            .await
            .expect("create");

        assert!(matches!(
            service.mark_read(other.id, notification.id).await,
            Err(NotificationServiceError::NotFound)
        ));
        service
            .mark_read(user.id, notification.id)
            .await
            .expect("mark read");

        assert!(service.list(user.id, true).await.expect("list").is_empty());
        assert_eq!(service.list(user.id, false).await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let executor = setup_executor().await;
        let user = seed_user(&executor, "u@example.com", UserRole::Tenant).await;
        let repo = SqlxNotificationRepository::new(executor.clone());
        let service = NotificationService::new(SqlxNotificationRepository::shared(executor));

        for _ in 0..3 {
            repo.create(user.id, NotificationKind::VisitCancelled, "Visita cancelada")
                .await
                .expect("create");
        }

        assert_eq!(service.mark_all_read(user.id).await.expect("mark"), 3);
        assert_eq!(service.mark_all_read(user.id).await.expect("mark"), 0);
    }
}
