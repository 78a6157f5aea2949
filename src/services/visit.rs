//! Visit service
//!
//! Scheduling rules: only active listings can be visited, the owner is
//! derived from the listing (never supplied by the client), and only the
//! property owner moves a visit past Pending.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::db::repositories::{NotificationRepository, PropertyRepository, VisitRepository};
use crate::models::visit::{Visit, VisitStatus, VisitWithDetails};
use crate::models::{NotificationKind, User};

#[derive(Debug, thiserror::Error)]
pub enum VisitServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Listing not found")]
    PropertyNotFound,

    #[error("Visit not found")]
    NotFound,

    #[error("Not allowed to update this visit")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct VisitService {
    visit_repo: Arc<dyn VisitRepository>,
    property_repo: Arc<dyn PropertyRepository>,
    notification_repo: Arc<dyn NotificationRepository>,
}

impl VisitService {
    pub fn new(
        visit_repo: Arc<dyn VisitRepository>,
        property_repo: Arc<dyn PropertyRepository>,
        notification_repo: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            visit_repo,
            property_repo,
            notification_repo,
        }
    }

    /// Visits where the user is the tenant.
    pub async fn list_as_tenant(
        &self,
        tenant_id: i64,
    ) -> Result<Vec<VisitWithDetails>, VisitServiceError> {
        Ok(self.visit_repo.list_for_tenant(tenant_id).await?)
    }

    /// Visits on the user's listings.
    pub async fn list_as_owner(
        &self,
        owner_id: i64,
    ) -> Result<Vec<VisitWithDetails>, VisitServiceError> {
        Ok(self.visit_repo.list_for_owner(owner_id).await?)
    }

    pub async fn schedule(
        &self,
        tenant_id: i64,
        property_id: i64,
        scheduled_at: DateTime<Utc>,
        notes: Option<&str>,
    ) -> Result<Visit, VisitServiceError> {
        let property = self
            .property_repo
            .get_by_id(property_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(VisitServiceError::PropertyNotFound)?;

        if property.owner_id == tenant_id {
            return Err(VisitServiceError::Validation(
                "Cannot schedule a visit to your own listing".into(),
            ));
        }
        if scheduled_at <= Utc::now() {
            return Err(VisitServiceError::Validation(
                "Visit must be scheduled in the future".into(),
            ));
        }

        let visit = self
            .visit_repo
            .create(property.id, tenant_id, property.owner_id, scheduled_at, notes)
            .await?;
        tracing::info!(visit_id = visit.id, property_id, "visit scheduled");
        Ok(visit)
    }

    /// Confirm or cancel; the tenant who asked may cancel, everything else
    /// is the owner's call.
    pub async fn update_status(
        &self,
        user: &User,
        visit_id: i64,
        status: VisitStatus,
    ) -> Result<Visit, VisitServiceError> {
        let visit = self
            .visit_repo
            .get_by_id(visit_id)
            .await?
            .ok_or(VisitServiceError::NotFound)?;

        let is_owner = visit.owner_id == user.id || user.is_admin();
        let tenant_cancelling = visit.tenant_id == user.id && status == VisitStatus::Cancelled;
        if !is_owner && !tenant_cancelling {
            return Err(VisitServiceError::Forbidden);
        }
        if visit.status == VisitStatus::Cancelled || visit.status == VisitStatus::Completed {
            return Err(VisitServiceError::Validation(
                "Visit is already closed".into(),
            ));
        }

        let updated = self.visit_repo.update_status(visit_id, status).await?;

        // The tenant hears about owner decisions
        if is_owner {
            let kind = match status {
                VisitStatus::Confirmed => Some(NotificationKind::VisitConfirmed),
                VisitStatus::Cancelled => Some(NotificationKind::VisitCancelled),
                _ => None,
            };
            if let Some(kind) = kind {
                self.notification_repo
                    .create(
                        visit.tenant_id,
                        kind,
                        &format!("Tu visita #{} fue {}", visit.id, status),
                    )
                    .await?;
            }
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seed_property, seed_user, setup_executor};
    use crate::db::repositories::{
        NotificationRepository as _, SqlxNotificationRepository, SqlxPropertyRepository,
        SqlxVisitRepository,
    };
    use crate::db::QueryExecutor;
    use crate::models::UserRole;
    use chrono::Duration;

    fn service(executor: &QueryExecutor) -> VisitService {
        VisitService::new(
            SqlxVisitRepository::shared(executor.clone()),
            SqlxPropertyRepository::shared(executor.clone()),
            SqlxNotificationRepository::shared(executor.clone()),
        )
    }

    #[tokio::test]
    async fn test_schedule_derives_owner() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let service = service(&executor);

        let visit = service
            .schedule(tenant.id, property_id, Utc::now() + Duration::days(1), None)
            .await
            .expect("schedule");
        assert_eq!(visit.owner_id, owner.id);
        assert_eq!(visit.status, VisitStatus::Pending);
    }

    #[tokio::test]
    async fn test_schedule_rejects_past_and_own_listing() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let service = service(&executor);

        assert!(matches!(
            service
                .schedule(tenant.id, property_id, Utc::now() - Duration::hours(1), None)
                .await,
            Err(VisitServiceError::Validation(_))
        ));

        assert!(matches!(
            service
                .schedule(owner.id, property_id, Utc::now() + Duration::days(1), None)
                .await,
            Err(VisitServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_only_owner_confirms() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let service = service(&executor);

        let visit = service
            .schedule(tenant.id, property_id, Utc::now() + Duration::days(1), None)
            .await
            .expect("schedule");

        assert!(matches!(
            service
                .update_status(&tenant, visit.id, VisitStatus::Confirmed)
                .await,
            Err(VisitServiceError::Forbidden)
        ));

        let confirmed = service
            .update_status(&owner, visit.id, VisitStatus::Confirmed)
            .await
            .expect("confirm");
        assert_eq!(confirmed.status, VisitStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_tenant_may_cancel_and_owner_decision_notifies() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let service = service(&executor);

        let visit = service
            .schedule(tenant.id, property_id, Utc::now() + Duration::days(1), None)
            .await
            .expect("schedule");
        service
            .update_status(&tenant, visit.id, VisitStatus::Cancelled)
            .await
            .expect("tenant cancel");

        // Owner confirmation notifies the tenant
        let visit = service
            .schedule(tenant.id, property_id, Utc::now() + Duration::days(2), None)
            .await
            .expect("schedule");
        service
            .update_status(&owner, visit.id, VisitStatus::Confirmed)
            .await
            .expect("confirm");

        let notifications = SqlxNotificationRepository::new(executor.clone());
        let unread = notifications
            .list_for_user(tenant.id, true)
            .await
            .expect("list");
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].kind, NotificationKind::VisitConfirmed);
    }

    #[tokio::test]
    async fn test_closed_visit_cannot_change() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let service = service(&executor);

        let visit = service
            .schedule(tenant.id, property_id, Utc::now() + Duration::days(1), None)
            .await
            .expect("schedule");
        service
            .update_status(&owner, visit.id, VisitStatus::Cancelled)
            .await
            .expect("cancel");

        assert!(matches!(
            service
                .update_status(&owner, visit.id, VisitStatus::Confirmed)
                .await,
            Err(VisitServiceError::Validation(_))
        ));
    }
}
