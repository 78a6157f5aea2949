//! Contract service
//!
//! Contracts are created by the listing owner against an existing tenant.
//! Dates must be ordered and the rent positive; the tenant is notified.

use anyhow::Result;
use std::sync::Arc;

use crate::db::repositories::{
    ContractRepository, NotificationRepository, PropertyRepository, UserRepository,
};
use crate::models::contract::{Contract, ContractWithDetails, CreateContractInput};
use crate::models::{NotificationKind, User};

#[derive(Debug, thiserror::Error)]
pub enum ContractServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Listing not found")]
    PropertyNotFound,

    #[error("Tenant not found")]
    TenantNotFound,

    #[error("Not allowed to create a contract for this listing")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct ContractService {
    contract_repo: Arc<dyn ContractRepository>,
    property_repo: Arc<dyn PropertyRepository>,
    user_repo: Arc<dyn UserRepository>,
    notification_repo: Arc<dyn NotificationRepository>,
}

impl ContractService {
    pub fn new(
        contract_repo: Arc<dyn ContractRepository>,
        property_repo: Arc<dyn PropertyRepository>,
        user_repo: Arc<dyn UserRepository>,
        notification_repo: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            contract_repo,
            property_repo,
            user_repo,
            notification_repo,
        }
    }

    pub async fn list_as_owner(
        &self,
        owner_id: i64,
    ) -> Result<Vec<ContractWithDetails>, ContractServiceError> {
        Ok(self.contract_repo.list_for_owner(owner_id).await?)
    }

    pub async fn list_as_tenant(
        &self,
        tenant_id: i64,
    ) -> Result<Vec<ContractWithDetails>, ContractServiceError> {
        Ok(self.contract_repo.list_for_tenant(tenant_id).await?)
    }

    pub async fn create(
        &self,
        user: &User,
        input: CreateContractInput,
    ) -> Result<Contract, ContractServiceError> {
        let property = self
            .property_repo
            .get_by_id(input.property_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(ContractServiceError::PropertyNotFound)?;
        if property.owner_id != user.id && !user.is_admin() {
            return Err(ContractServiceError::Forbidden);
        }

        if input.start_date >= input.end_date {
            return Err(ContractServiceError::Validation(
                "Start date must come before end date".into(),
            ));
        }
        if input.monthly_rent <= 0.0 {
            return Err(ContractServiceError::Validation(
                "Monthly rent must be positive".into(),
            ));
        }
        if input.tenant_id == property.owner_id {
            return Err(ContractServiceError::Validation(
                "Owner and tenant cannot be the same user".into(),
            ));
        }

        let tenant = self
            .user_repo
            .get_by_id(input.tenant_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(ContractServiceError::TenantNotFound)?;

        let contract = self.contract_repo.create(property.owner_id, &input).await?;

        self.notification_repo
            .create(
                tenant.id,
                NotificationKind::ContractCreated,
                &format!("Se creó tu contrato de arriendo por \"{}\"", property.title),
            )
            .await?;

        tracing::info!(
            contract_id = contract.id,
            property_id = property.id,
            "contract created"
        );
        Ok(contract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seed_property, seed_user, setup_executor};
    use crate::db::repositories::{
        NotificationRepository as _, SqlxContractRepository, SqlxNotificationRepository,
        SqlxPropertyRepository, SqlxUserRepository,
    };
    use crate::db::QueryExecutor;
    use crate::models::UserRole;
    use chrono::NaiveDate;

    fn service(executor: &QueryExecutor) -> ContractService {
        ContractService::new(
            SqlxContractRepository::shared(executor.clone()),
            SqlxPropertyRepository::shared(executor.clone()),
            SqlxUserRepository::shared(executor.clone()),
            SqlxNotificationRepository::shared(executor.clone()),
        )
    }

    fn input(property_id: i64, tenant_id: i64) -> CreateContractInput {
        CreateContractInput {
            property_id,
            tenant_id,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 1).expect("date"),
            end_date: NaiveDate::from_ymd_opt(2027, 2, 28).expect("date"),
            monthly_rent: 450_000.0,
            document_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_notifies_tenant() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let service = service(&executor);

        let contract = service
            .create(&owner, input(property_id, tenant.id))
            .await
            .expect("create");
        assert_eq!(contract.owner_id, owner.id);
        assert_eq!(contract.tenant_id, tenant.id);

        let notifications = SqlxNotificationRepository::new(executor.clone());
        let unread = notifications
            .list_for_user(tenant.id, true)
            .await
            .expect("list");
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].kind, NotificationKind::ContractCreated);
    }

    #[tokio::test]
    async fn test_only_listing_owner_creates() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let other = seed_user(&executor, "x@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let service = service(&executor);

        assert!(matches!(
            service.create(&other, input(property_id, tenant.id)).await,
            Err(ContractServiceError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_date_order_and_rent_validated() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let service = service(&executor);

        let mut bad = input(property_id, tenant.id);
        bad.end_date = bad.start_date;
        assert!(matches!(
            service.create(&owner, bad).await,
            Err(ContractServiceError::Validation(_))
        ));

        let mut bad = input(property_id, tenant.id);
        bad.monthly_rent = 0.0;
        assert!(matches!(
            service.create(&owner, bad).await,
            Err(ContractServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_lists_per_party() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let service = service(&executor);

        service
            .create(&owner, input(property_id, tenant.id))
            .await
            .expect("create");

        assert_eq!(service.list_as_owner(owner.id).await.expect("owner").len(), 1);
        assert_eq!(service.list_as_tenant(tenant.id).await.expect("tenant").len(), 1);
        assert!(service.list_as_tenant(owner.id).await.expect("none").is_empty());
    }
}
