//! Favorite service

use anyhow::Result;
use std::sync::Arc;

use crate::db::repositories::{FavoriteRepository, PropertyRepository};
use crate::models::{Favorite, FavoriteWithProperty};

#[derive(Debug, thiserror::Error)]
pub enum FavoriteServiceError {
    #[error("Listing not found")]
    PropertyNotFound,

    #[error("Favorite not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct FavoriteService {
    favorite_repo: Arc<dyn FavoriteRepository>,
    property_repo: Arc<dyn PropertyRepository>,
}

impl FavoriteService {
    pub fn new(
        favorite_repo: Arc<dyn FavoriteRepository>,
        property_repo: Arc<dyn PropertyRepository>,
    ) -> Self {
        Self {
            favorite_repo,
            property_repo,
        }
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<FavoriteWithProperty>, FavoriteServiceError> {
        Ok(self.favorite_repo.list_for_user(user_id).await?)
    }

    /// Save a listing. Adding the same listing twice is a no-op that
    /// returns the existing favorite.
    pub async fn add(
        &self,
        user_id: i64,
        property_id: i64,
    ) -> Result<Favorite, FavoriteServiceError> {
        let property = self
            .property_repo
            .get_by_id(property_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(FavoriteServiceError::PropertyNotFound)?;

        Ok(self.favorite_repo.create(user_id, property.id).await?)
    }

    pub async fn remove(
        &self,
        user_id: i64,
        property_id: i64,
    ) -> Result<(), FavoriteServiceError> {
        if !self.favorite_repo.delete(user_id, property_id).await? {
            return Err(FavoriteServiceError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seed_property, seed_user, setup_executor};
    use crate::db::repositories::{SqlxFavoriteRepository, SqlxPropertyRepository};
    use crate::db::QueryExecutor;
    use crate::models::UserRole;

    fn service(executor: &QueryExecutor) -> FavoriteService {
        FavoriteService::new(
            SqlxFavoriteRepository::shared(executor.clone()),
            SqlxPropertyRepository::shared(executor.clone()),
        )
    }

    #[tokio::test]
    async fn test_add_twice_is_idempotent() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let service = service(&executor);

        let first = service.add(tenant.id, property_id).await.expect("add");
        let second = service.add(tenant.id, property_id).await.expect("add again");
        assert_eq!(first.id, second.id);

        assert_eq!(service.list(tenant.id).await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn test_add_missing_property() {
        let executor = setup_executor().await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let service = service(&executor);

        assert!(matches!(
            service.add(tenant.id, 9999).await,
            Err(FavoriteServiceError::PropertyNotFound)
        ));
    }

    #[tokio::test]
    async fn test_remove_missing_favorite() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "o@example.com", UserRole::Owner).await;
        let tenant = seed_user(&executor, "t@example.com", UserRole::Tenant).await;
        let property_id = seed_property(&executor, owner.id).await;
        let service = service(&executor);

        assert!(matches!(
            service.remove(tenant.id, property_id).await,
            Err(FavoriteServiceError::NotFound)
        ));

        service.add(tenant.id, property_id).await.expect("add");
        service.remove(tenant.id, property_id).await.expect("remove");
    }
}
