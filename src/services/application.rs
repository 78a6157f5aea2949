//! Rental application service
//!
//! A tenant applies at most once per listing; the property owner decides
//! and the tenant is notified of the outcome.

use anyhow::Result;
use std::sync::Arc;

use crate::db::repositories::{
    ApplicationRepository, NotificationRepository, PropertyRepository,
};
use crate::models::application::{Application, ApplicationStatus, ApplicationWithDetails};
use crate::models::{NotificationKind, PropertyStatus, User};

#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Listing not found")]
    PropertyNotFound,

    #[error("Application not found")]
    NotFound,

    #[error("You already applied to this listing")]
    AlreadyApplied,

    #[error("Not allowed to decide this application")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct ApplicationService {
    application_repo: Arc<dyn ApplicationRepository>,
    property_repo: Arc<dyn PropertyRepository>,
    notification_repo: Arc<dyn NotificationRepository>,
}

impl ApplicationService {
    pub fn new(
        application_repo: Arc<dyn ApplicationRepository>,
        property_repo: Arc<dyn PropertyRepository>,
        notification_repo: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            application_repo,
            property_repo,
            notification_repo,
        }
    }

    pub async fn list_as_tenant(
        &self,
        tenant_id: i64,
    ) -> Result<Vec<ApplicationWithDetails>, ApplicationServiceError> {
        Ok(self.application_repo.list_for_tenant(tenant_id).await?)
    }

    pub async fn list_as_owner(
        &self,
        owner_id: i64,
    ) -> Result<Vec<ApplicationWithDetails>, ApplicationServiceError> {
        Ok(self.application_repo.list_for_owner(owner_id).await?)
    }

    pub async fn apply(
        &self,
        tenant_id: i64,
        property_id: i64,
        message: Option<&str>,
    ) -> Result<Application, ApplicationServiceError> {
        let property = self
            .property_repo
            .get_by_id(property_id)
            .await?
            .filter(|p| p.is_active && p.status == PropertyStatus::Published)
            .ok_or(ApplicationServiceError::PropertyNotFound)?;

        if property.owner_id == tenant_id {
            return Err(ApplicationServiceError::Validation(
                "Cannot apply to your own listing".into(),
            ));
        }
        if self.application_repo.exists(tenant_id, property.id).await? {
            return Err(ApplicationServiceError::AlreadyApplied);
        }

        let application = self
            .application_repo
            .create(property.id, tenant_id, message)
            .await?;
        tracing::info!(
            application_id = application.id,
            property_id,
            "application submitted"
        );
        Ok(application)
    }

    /// Accept or reject. Only the owner of the listing (or an admin)
    /// decides, only once, and the tenant gets a notification either way.
    pub async fn decide(
        &self,
        user: &User,
        application_id: i64,
        accept: bool,
        response_message: Option<&str>,
    ) -> Result<Application, ApplicationServiceError> {
        let application = self
            .application_repo
            .get_by_id(application_id)
            .await?
            .ok_or(ApplicationServiceError::NotFound)?;

        let property = self
            .property_repo
            .get_by_id(application.property_id)
            .await?
            .ok_or(ApplicationServiceError::PropertyNotFound)?;
        if property.owner_id != user.id && !user.is_admin() {
            return Err(ApplicationServiceError::Forbidden);
        }
        if application.status != ApplicationStatus::Pending {
            return Err(ApplicationServiceError::Validation(
                "Application has already been decided".into(),
            ));
        }

        let status = if accept {
            ApplicationStatus::Accepted
        } else {
            ApplicationStatus::Rejected
        };
        let decided = self
            .application_repo
            .decide(application_id, status, response_message)
            .await?;

        let kind = if accept {
            NotificationKind::ApplicationAccepted
        } else {
            NotificationKind::ApplicationRejected
        };
        self.notification_repo
            .create(
                application.tenant_id,
                kind,
                &format!("Tu postulación a \"{}\" fue {}", property.title, status),
            )
            .await?;

        tracing::info!(application_id, %status, "application decided");
        Ok(decided)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seed_property, seed_user, setup_executor};
    use crate::db::repositories::{
        NotificationRepository as _, SqlxApplicationRepository, SqlxNotificationRepository,
        SqlxPropertyRepository,
    };
    use crate::db::QueryExecutor;
    use crate::models::UserRole;

    fn service(executor: &QueryExecutor) -> ApplicationService {
        ApplicationService::new(
            SqlxApplicationRepository::shared(executor.clone()),
            SqlxPropertyRepository::shared(executor.clone()),
            SqlxNotificationRepository::shared(executor.clone()),
        )
    }

    #[tokio::test]
    async fn test_apply_once() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let service = service(&executor);

        let application = service
            .apply(tenant.id, property_id, Some("Renta demostrable"))
            .await
            .expect("apply");
        assert_eq!(application.status, ApplicationStatus::Pending);

        assert!(matches!(
            service.apply(tenant.id, property_id, None).await,
            Err(ApplicationServiceError::AlreadyApplied)
        ));
    }

    #[tokio::test]
    async fn test_cannot_apply_to_own_listing() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let property_id = seed_property(&executor, owner.id).await;
        let service = service(&executor);

        assert!(matches!(
            service.apply(owner.id, property_id, None).await,
            Err(ApplicationServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_decide_owner_only_and_notifies() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let other = seed_user(&executor, "x@example.com", UserRole::Owner).await;
        let property_id = seed_property(&executor, owner.id).await;
        let service = service(&executor);

        let application = service
            .apply(tenant.id, property_id, None)
            .await
            .expect("apply");

        assert!(matches!(
            service.decide(&other, application.id, true, None).await,
            Err(ApplicationServiceError::Forbidden)
        ));

        let decided = service
            .decide(&owner, application.id, true, Some("Bienvenido"))
            .await
            .expect("decide");
        assert_eq!(decided.status, ApplicationStatus::Accepted);
        assert!(decided.decided_at.is_some());

        let notifications = SqlxNotificationRepository::new(executor.clone());
        let unread = notifications
            .list_for_user(tenant.id, true)
            .await
            .expect("list");
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].kind, NotificationKind::ApplicationAccepted);
    }

    #[tokio::test]
    async fn test_decide_only_once() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let service = service(&executor);

        let application = service
            .apply(tenant.id, property_id, None)
            .await
            .expect("apply");
        service
            .decide(&owner, application.id, false, None)
            .await
            .expect("decide");

        assert!(matches!(
            service.decide(&owner, application.id, true, None).await,
            Err(ApplicationServiceError::Validation(_))
        ));
    }
}
