//! Rental application repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

use crate::db::QueryExecutor;
use crate::models::{Application, ApplicationStatus, ApplicationWithDetails};

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Applications filed by a tenant
    async fn list_for_tenant(&self, tenant_id: i64) -> Result<Vec<ApplicationWithDetails>>;

    /// Applications received on an owner's listings
    async fn list_for_owner(&self, owner_id: i64) -> Result<Vec<ApplicationWithDetails>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Application>>;

    /// Whether the tenant already applied to this listing
    async fn exists(&self, tenant_id: i64, property_id: i64) -> Result<bool>;

    async fn create(
        &self,
        property_id: i64,
        tenant_id: i64,
        message: Option<&str>,
    ) -> Result<Application>;

    /// Record the owner's decision
    async fn decide(
        &self,
        id: i64,
        status: ApplicationStatus,
        response_message: Option<&str>,
    ) -> Result<Application>;
}

pub struct SqlxApplicationRepository {
    executor: QueryExecutor,
}

impl SqlxApplicationRepository {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    pub fn shared(executor: QueryExecutor) -> Arc<dyn ApplicationRepository> {
        Arc::new(Self::new(executor))
    }
}

#[async_trait]
impl ApplicationRepository for SqlxApplicationRepository {
    async fn list_for_tenant(&self, tenant_id: i64) -> Result<Vec<ApplicationWithDetails>> {
        let rows = self
            .executor
            .fetch_all(
                &format!("{} WHERE a.tenant_id = ? ORDER BY a.created_at DESC", SELECT_DETAILS),
                &[tenant_id.into()],
            )
            .await
            .context("Failed to list tenant applications")?;

        rows.iter().map(row_to_details).collect()
    }

    async fn list_for_owner(&self, owner_id: i64) -> Result<Vec<ApplicationWithDetails>> {
        let rows = self
            .executor
            .fetch_all(
                &format!("{} WHERE p.owner_id = ? ORDER BY a.created_at DESC", SELECT_DETAILS),
                &[owner_id.into()],
            )
            .await
            .context("Failed to list owner applications")?;

        rows.iter().map(row_to_details).collect()
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Application>> {
        let row = self
            .executor
            .fetch_optional(
                r#"
                SELECT id, property_id, tenant_id, message, status, response_message,
                       created_at, decided_at
                FROM applications WHERE id = ?
                "#,
                &[id.into()],
            )
            .await
            .context("Failed to get application")?;

        row.map(|row| row_to_application(&row)).transpose()
    }

    async fn exists(&self, tenant_id: i64, property_id: i64) -> Result<bool> {
        let row = self
            .executor
            .fetch_one(
                "SELECT COUNT(*) as count FROM applications WHERE tenant_id = ? AND property_id = ?",
                &[tenant_id.into(), property_id.into()],
            )
            .await
            .context("Failed to check application")?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn create(
        &self,
        property_id: i64,
        tenant_id: i64,
        message: Option<&str>,
    ) -> Result<Application> {
        let result = self
            .executor
            .execute(
                r#"
                INSERT INTO applications (property_id, tenant_id, message, status, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
                &[
                    property_id.into(),
                    tenant_id.into(),
                    message.map(str::to_string).into(),
                    ApplicationStatus::Pending.to_string().into(),
                    Utc::now().into(),
                ],
            )
            .await
            .context("Failed to create application")?;

        self.get_by_id(result.last_insert_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Application not found after insert"))
    }

    async fn decide(
        &self,
        id: i64,
        status: ApplicationStatus,
        response_message: Option<&str>,
    ) -> Result<Application> {
        self.executor
            .execute(
                "UPDATE applications SET status = ?, response_message = ?, decided_at = ? WHERE id = ?",
                &[
                    status.to_string().into(),
                    response_message.map(str::to_string).into(),
                    Utc::now().into(),
                    id.into(),
                ],
            )
            .await
            .context("Failed to decide application")?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Application not found after update"))
    }
}

const SELECT_DETAILS: &str = r#"
    SELECT a.id, a.property_id, a.tenant_id, a.message, a.status, a.response_message,
           a.created_at, a.decided_at,
           p.title as property_title,
           u.name as tenant_name, u.email as tenant_email
    FROM applications a
    JOIN properties p ON p.id = a.property_id
    JOIN users u ON u.id = a.tenant_id
"#;

fn row_to_application(row: &SqliteRow) -> Result<Application> {
    let status_str: String = row.get("status");
    Ok(Application {
        id: row.get("id"),
        property_id: row.get("property_id"),
        tenant_id: row.get("tenant_id"),
        message: row.get("message"),
        status: ApplicationStatus::from_str(&status_str)
            .with_context(|| format!("Invalid application status in database: {}", status_str))?,
        response_message: row.get("response_message"),
        created_at: row.get("created_at"),
        decided_at: row.get("decided_at"),
    })
}

fn row_to_details(row: &SqliteRow) -> Result<ApplicationWithDetails> {
    Ok(ApplicationWithDetails {
        application: row_to_application(row)?,
        property_title: row.get("property_title"),
        tenant_name: row.get("tenant_name"),
        tenant_email: row.get("tenant_email"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seed_property, seed_user, setup_executor};
    use crate::models::UserRole;

    #[tokio::test]
    async fn test_create_and_list() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let repo = SqlxApplicationRepository::new(executor);

        let application = repo
            .create(property_id, tenant.id, Some("Tengo contrato indefinido"))
            .await
            .expect("create");
        assert_eq!(application.status, ApplicationStatus::Pending);
        assert!(application.decided_at.is_none());

        let for_tenant = repo.list_for_tenant(tenant.id).await.expect("list");
        assert_eq!(for_tenant.len(), 1);
        assert_eq!(for_tenant[0].property_title, "Depto 2D1B Providencia");

        let for_owner = repo.list_for_owner(owner.id).await.expect("list");
        assert_eq!(for_owner.len(), 1);
        assert_eq!(for_owner[0].tenant_email, "t@example.com");
    }

    #[tokio::test]
    async fn test_exists() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let repo = SqlxApplicationRepository::new(executor);

        assert!(!repo.exists(tenant.id, property_id).await.expect("exists"));
        repo.create(property_id, tenant.id, None).await.expect("create");
        assert!(repo.exists(tenant.id, property_id).await.expect("exists"));
    }

    #[tokio::test]
    async fn test_decide() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let repo = SqlxApplicationRepository::new(executor);

        let application = repo.create(property_id, tenant.id, None).await.expect("create");

        let decided = repo
            .decide(application.id, ApplicationStatus::Accepted, Some("Bienvenida"))
            .await
            .expect("decide");
        assert_eq!(decided.status, ApplicationStatus::Accepted);
        assert_eq!(decided.response_message.as_deref(), Some("Bienvenida"));
        assert!(decided.decided_at.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_pair_rejected_by_schema() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let repo = SqlxApplicationRepository::new(executor);

        repo.create(property_id, tenant.id, None).await.expect("create");
        let dup = repo.create(property_id, tenant.id, None).await;
        assert!(dup.is_err());
    }
}
