//! Favorite repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

use crate::db::QueryExecutor;
use crate::models::{Favorite, FavoriteWithProperty, Operation, PropertyStatus, PropertyType};

#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// All favorites of one user, newest first, joined with a listing summary
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<FavoriteWithProperty>>;

    async fn find(&self, user_id: i64, property_id: i64) -> Result<Option<Favorite>>;

    /// Insert if absent; returns the favorite either way (idempotent add)
    async fn create(&self, user_id: i64, property_id: i64) -> Result<Favorite>;

    /// Remove a favorite, scoped to its owner; returns false when nothing
    /// matched
    async fn delete(&self, user_id: i64, property_id: i64) -> Result<bool>;
}

pub struct SqlxFavoriteRepository {
    executor: QueryExecutor,
}

impl SqlxFavoriteRepository {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    pub fn shared(executor: QueryExecutor) -> Arc<dyn FavoriteRepository> {
        Arc::new(Self::new(executor))
    }
}

#[async_trait]
impl FavoriteRepository for SqlxFavoriteRepository {
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<FavoriteWithProperty>> {
        let rows = self
            .executor
            .fetch_all(
                r#"
                SELECT f.id, f.property_id, f.created_at as favorited_at,
                       p.title, p.property_type, p.operation, p.price, p.currency,
                       p.address, p.thumbnail_url, p.status
                FROM favorites f
                JOIN properties p ON p.id = f.property_id
                WHERE f.user_id = ? AND p.is_active = 1
                ORDER BY f.created_at DESC
                "#,
                &[user_id.into()],
            )
            .await
            .context("Failed to list favorites")?;

        rows.iter().map(row_to_favorite_with_property).collect()
    }

    async fn find(&self, user_id: i64, property_id: i64) -> Result<Option<Favorite>> {
        let row = self
            .executor
            .fetch_optional(
                "SELECT id, user_id, property_id, created_at FROM favorites WHERE user_id = ? AND property_id = ?",
                &[user_id.into(), property_id.into()],
            )
            .await
            .context("Failed to find favorite")?;

        Ok(row.map(|row| row_to_favorite(&row)))
    }

    async fn create(&self, user_id: i64, property_id: i64) -> Result<Favorite> {
        // OR IGNORE rides on UNIQUE(user_id, property_id)
        self.executor
            .execute(
                "INSERT OR IGNORE INTO favorites (user_id, property_id, created_at) VALUES (?, ?, ?)",
                &[user_id.into(), property_id.into(), Utc::now().into()],
            )
            .await
            .context("Failed to create favorite")?;

        self.find(user_id, property_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Favorite not found after insert"))
    }

    async fn delete(&self, user_id: i64, property_id: i64) -> Result<bool> {
        let result = self
            .executor
            .execute(
                "DELETE FROM favorites WHERE user_id = ? AND property_id = ?",
                &[user_id.into(), property_id.into()],
            )
            .await
            .context("Failed to delete favorite")?;
        Ok(result.rows_affected > 0)
    }
}

fn row_to_favorite(row: &SqliteRow) -> Favorite {
    Favorite {
        id: row.get("id"),
        user_id: row.get("user_id"),
        property_id: row.get("property_id"),
        created_at: row.get("created_at"),
    }
}

fn row_to_favorite_with_property(row: &SqliteRow) -> Result<FavoriteWithProperty> {
    let type_str: String = row.get("property_type");
    let operation_str: String = row.get("operation");
    let status_str: String = row.get("status");

    Ok(FavoriteWithProperty {
        id: row.get("id"),
        property_id: row.get("property_id"),
        title: row.get("title"),
        property_type: PropertyType::from_str(&type_str)?,
        operation: Operation::from_str(&operation_str)?,
        price: row.get("price"),
        currency: row.get("currency"),
        address: row.get("address"),
        thumbnail_url: row.get("thumbnail_url"),
        status: PropertyStatus::from_str(&status_str)?,
        favorited_at: row.get("favorited_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seed_property, seed_user, setup_executor};
    use crate::models::UserRole;

    #[tokio::test]
    async fn test_add_and_list() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let repo = SqlxFavoriteRepository::new(executor);

        repo.create(tenant.id, property_id).await.expect("create");

        let favorites = repo.list_for_user(tenant.id).await.expect("list");
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].property_id, property_id);
        assert_eq!(favorites[0].title, "Depto 2D1B Providencia");
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let repo = SqlxFavoriteRepository::new(executor);

        let first = repo.create(tenant.id, property_id).await.expect("create");
        let second = repo.create(tenant.id, property_id).await.expect("create again");

        assert_eq!(first.id, second.id);
        assert_eq!(repo.list_for_user(tenant.id).await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn test_delete_scoped_to_user() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let other = seed_user(&executor, "x@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let repo = SqlxFavoriteRepository::new(executor);

        repo.create(tenant.id, property_id).await.expect("create");

        // A different user cannot remove it
        assert!(!repo.delete(other.id, property_id).await.expect("delete"));
        assert!(repo.delete(tenant.id, property_id).await.expect("delete"));
        assert!(repo.list_for_user(tenant.id).await.expect("list").is_empty());
    }
}
