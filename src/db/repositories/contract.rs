//! Contract repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

use crate::db::QueryExecutor;
use crate::models::{Contract, ContractStatus, ContractWithDetails, CreateContractInput};

#[async_trait]
pub trait ContractRepository: Send + Sync {
    async fn list_for_owner(&self, owner_id: i64) -> Result<Vec<ContractWithDetails>>;

    async fn list_for_tenant(&self, tenant_id: i64) -> Result<Vec<ContractWithDetails>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Contract>>;

    async fn create(&self, owner_id: i64, input: &CreateContractInput) -> Result<Contract>;
}

pub struct SqlxContractRepository {
    executor: QueryExecutor,
}

impl SqlxContractRepository {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    pub fn shared(executor: QueryExecutor) -> Arc<dyn ContractRepository> {
        Arc::new(Self::new(executor))
    }
}

#[async_trait]
impl ContractRepository for SqlxContractRepository {
    async fn list_for_owner(&self, owner_id: i64) -> Result<Vec<ContractWithDetails>> {
        let rows = self
            .executor
            .fetch_all(
                &format!("{} WHERE c.owner_id = ? ORDER BY c.created_at DESC", SELECT_DETAILS),
                &[owner_id.into()],
            )
            .await
            .context("Failed to list owner contracts")?;

        rows.iter().map(row_to_details).collect()
    }

    async fn list_for_tenant(&self, tenant_id: i64) -> Result<Vec<ContractWithDetails>> {
        let rows = self
            .executor
            .fetch_all(
                &format!("{} WHERE c.tenant_id = ? ORDER BY c.created_at DESC", SELECT_DETAILS),
                &[tenant_id.into()],
            )
            .await
            .context("Failed to list tenant contracts")?;

        rows.iter().map(row_to_details).collect()
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Contract>> {
        let row = self
            .executor
            .fetch_optional(
                r#"
                SELECT id, property_id, owner_id, tenant_id, start_date, end_date,
                       monthly_rent, status, document_url, created_at
                FROM contracts WHERE id = ?
                "#,
                &[id.into()],
            )
            .await
            .context("Failed to get contract")?;

        row.map(|row| row_to_contract(&row)).transpose()
    }

    async fn create(&self, owner_id: i64, input: &CreateContractInput) -> Result<Contract> {
        let result = self
            .executor
            .execute(
                r#"
                INSERT INTO contracts (property_id, owner_id, tenant_id, start_date, end_date,
                                       monthly_rent, status, document_url, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
                &[
                    input.property_id.into(),
                    owner_id.into(),
                    input.tenant_id.into(),
                    input.start_date.into(),
                    input.end_date.into(),
                    input.monthly_rent.into(),
                    ContractStatus::Active.to_string().into(),
                    input.document_url.clone().into(),
                    Utc::now().into(),
                ],
            )
            .await
            .context("Failed to create contract")?;

        self.get_by_id(result.last_insert_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Contract not found after insert"))
    }
}

const SELECT_DETAILS: &str = r#"
    SELECT c.id, c.property_id, c.owner_id, c.tenant_id, c.start_date, c.end_date,
           c.monthly_rent, c.status, c.document_url, c.created_at,
           p.title as property_title,
           o.name as owner_name, t.name as tenant_name
    FROM contracts c
    JOIN properties p ON p.id = c.property_id
    JOIN users o ON o.id = c.owner_id
    JOIN users t ON t.id = c.tenant_id
"#;

fn row_to_contract(row: &SqliteRow) -> Result<Contract> {
    let status_str: String = row.get("status");
    Ok(Contract {
        id: row.get("id"),
        property_id: row.get("property_id"),
        owner_id: row.get("owner_id"),
        tenant_id: row.get("tenant_id"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        monthly_rent: row.get("monthly_rent"),
        status: ContractStatus::from_str(&status_str)
            .with_context(|| format!("Invalid contract status in database: {}", status_str))?,
        document_url: row.get("document_url"),
        created_at: row.get("created_at"),
    })
}

fn row_to_details(row: &SqliteRow) -> Result<ContractWithDetails> {
    Ok(ContractWithDetails {
        contract: row_to_contract(row)?,
        property_title: row.get("property_title"),
        owner_name: row.get("owner_name"),
        tenant_name: row.get("tenant_name"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seed_property, seed_user, setup_executor};
    use crate::models::UserRole;
    use chrono::NaiveDate;

    fn sample_input(property_id: i64, tenant_id: i64) -> CreateContractInput {
        CreateContractInput {
            property_id,
            tenant_id,
            start_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2027, 8, 31).unwrap(),
            monthly_rent: 450_000.0,
            document_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_both_parties() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let repo = SqlxContractRepository::new(executor);

        let contract = repo
            .create(owner.id, &sample_input(property_id, tenant.id))
            .await
            .expect("create");
        assert_eq!(contract.status, ContractStatus::Active);
        assert_eq!(contract.monthly_rent, 450_000.0);

        let owner_side = repo.list_for_owner(owner.id).await.expect("list");
        assert_eq!(owner_side.len(), 1);
        assert_eq!(owner_side[0].tenant_name, format!("User {}", "t@example.com"));

        let tenant_side = repo.list_for_tenant(tenant.id).await.expect("list");
        assert_eq!(tenant_side.len(), 1);
        assert_eq!(tenant_side[0].property_title, "Depto 2D1B Providencia");
    }

    #[tokio::test]
    async fn test_dates_survive_round_trip() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let repo = SqlxContractRepository::new(executor);

        let contract = repo
            .create(owner.id, &sample_input(property_id, tenant.id))
            .await
            .expect("create");

        assert_eq!(contract.start_date, NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
        assert_eq!(contract.end_date, NaiveDate::from_ymd_opt(2027, 8, 31).unwrap());
    }
}
