//! Visit repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

use crate::db::QueryExecutor;
use crate::models::visit::{Visit, VisitStatus, VisitWithDetails};

#[async_trait]
pub trait VisitRepository: Send + Sync {
    /// Visits requested by a tenant, owner contact joined
    async fn list_for_tenant(&self, tenant_id: i64) -> Result<Vec<VisitWithDetails>>;

    /// Visits on an owner's listings, tenant contact joined
    async fn list_for_owner(&self, owner_id: i64) -> Result<Vec<VisitWithDetails>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Visit>>;

    async fn create(
        &self,
        property_id: i64,
        tenant_id: i64,
        owner_id: i64,
        scheduled_at: DateTime<Utc>,
        notes: Option<&str>,
    ) -> Result<Visit>;

    async fn update_status(&self, id: i64, status: VisitStatus) -> Result<Visit>;
}

pub struct SqlxVisitRepository {
    executor: QueryExecutor,
}

impl SqlxVisitRepository {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    pub fn shared(executor: QueryExecutor) -> Arc<dyn VisitRepository> {
        Arc::new(Self::new(executor))
    }
}

#[async_trait]
impl VisitRepository for SqlxVisitRepository {
    async fn list_for_tenant(&self, tenant_id: i64) -> Result<Vec<VisitWithDetails>> {
        let rows = self
            .executor
            .fetch_all(
                &format!(
                    "{} JOIN users u ON u.id = v.owner_id WHERE v.tenant_id = ? ORDER BY v.scheduled_at DESC",
                    SELECT_VISIT_DETAILS
                ),
                &[tenant_id.into()],
            )
            .await
            .context("Failed to list tenant visits")?;

        rows.iter().map(row_to_visit_with_details).collect()
    }

    async fn list_for_owner(&self, owner_id: i64) -> Result<Vec<VisitWithDetails>> {
        let rows = self
            .executor
            .fetch_all(
                &format!(
                    "{} JOIN users u ON u.id = v.tenant_id WHERE v.owner_id = ? ORDER BY v.scheduled_at DESC",
                    SELECT_VISIT_DETAILS
                ),
                &[owner_id.into()],
            )
            .await
            .context("Failed to list owner visits")?;

        rows.iter().map(row_to_visit_with_details).collect()
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Visit>> {
        let row = self
            .executor
            .fetch_optional(
                r#"
                SELECT id, property_id, tenant_id, owner_id, scheduled_at, status, notes,
                       created_at, updated_at
                FROM visits WHERE id = ?
                "#,
                &[id.into()],
            )
            .await
            .context("Failed to get visit")?;

        row.map(|row| row_to_visit(&row)).transpose()
    }

    async fn create(
        &self,
        property_id: i64,
        tenant_id: i64,
        owner_id: i64,
        scheduled_at: DateTime<Utc>,
        notes: Option<&str>,
    ) -> Result<Visit> {
        let now = Utc::now();
        let result = self
            .executor
            .execute(
                r#"
                INSERT INTO visits (property_id, tenant_id, owner_id, scheduled_at, status, notes, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
                &[
                    property_id.into(),
                    tenant_id.into(),
                    owner_id.into(),
                    scheduled_at.into(),
                    VisitStatus::Pending.to_string().into(),
                    notes.map(str::to_string).into(),
                    now.into(),
                    now.into(),
                ],
            )
            .await
            .context("Failed to create visit")?;

        self.get_by_id(result.last_insert_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Visit not found after insert"))
    }

    async fn update_status(&self, id: i64, status: VisitStatus) -> Result<Visit> {
        self.executor
            .execute(
                "UPDATE visits SET status = ?, updated_at = ? WHERE id = ?",
                &[status.to_string().into(), Utc::now().into(), id.into()],
            )
            .await
            .context("Failed to update visit status")?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Visit not found after update"))
    }
}

const SELECT_VISIT_DETAILS: &str = r#"
    SELECT v.id, v.property_id, v.tenant_id, v.owner_id, v.scheduled_at, v.status,
           v.notes, v.created_at, v.updated_at,
           p.title as property_title, p.address as property_address,
           u.name as counterpart_name, u.phone as counterpart_phone
    FROM visits v
    JOIN properties p ON p.id = v.property_id
"#;

fn row_to_visit(row: &SqliteRow) -> Result<Visit> {
    let status_str: String = row.get("status");
    Ok(Visit {
        id: row.get("id"),
        property_id: row.get("property_id"),
        tenant_id: row.get("tenant_id"),
        owner_id: row.get("owner_id"),
        scheduled_at: row.get("scheduled_at"),
        status: VisitStatus::from_str(&status_str)
            .with_context(|| format!("Invalid visit status in database: {}", status_str))?,
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_visit_with_details(row: &SqliteRow) -> Result<VisitWithDetails> {
    Ok(VisitWithDetails {
        visit: row_to_visit(row)?,
        property_title: row.get("property_title"),
        property_address: row.get("property_address"),
        counterpart_name: row.get("counterpart_name"),
        counterpart_phone: row.get("counterpart_phone"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seed_property, seed_user, setup_executor};
    use crate::models::UserRole;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_and_list_both_sides() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let repo = SqlxVisitRepository::new(executor);

        let when = Utc::now() + Duration::days(2);
        let visit = repo
            .create(property_id, tenant.id, owner.id, when, Some("Después de las 18h"))
            .await
            .expect("create");
        assert_eq!(visit.status, VisitStatus::Pending);

        let tenant_side = repo.list_for_tenant(tenant.id).await.expect("list");
        assert_eq!(tenant_side.len(), 1);
        // Tenant sees the owner as counterpart
        assert_eq!(tenant_side[0].counterpart_name, format!("User {}", "o@example.com"));

        let owner_side = repo.list_for_owner(owner.id).await.expect("list");
        assert_eq!(owner_side.len(), 1);
        assert_eq!(owner_side[0].counterpart_name, format!("User {}", "t@example.com"));
    }

    #[tokio::test]
    async fn test_update_status() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let repo = SqlxVisitRepository::new(executor);

        let visit = repo
            .create(property_id, tenant.id, owner.id, Utc::now() + Duration::days(1), None)
            .await
            .expect("create");

        let confirmed = repo
            .update_status(visit.id, VisitStatus::Confirmed)
            .await
            .expect("update");
        assert_eq!(confirmed.status, VisitStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_lists_empty_for_uninvolved_user() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let outsider = seed_user(&executor, "x@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let repo = SqlxVisitRepository::new(executor);

        repo.create(property_id, tenant.id, owner.id, Utc::now(), None)
            .await
            .expect("create");

        assert!(repo.list_for_tenant(outsider.id).await.expect("list").is_empty());
        assert!(repo.list_for_owner(outsider.id).await.expect("list").is_empty());
    }
}
