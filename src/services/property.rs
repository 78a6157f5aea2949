//! Property service
//!
//! Listing search, owner CRUD and admin moderation. Ownership is enforced
//! here, not in the handlers.

use anyhow::Result;
use std::sync::Arc;

use crate::db::repositories::{AuditRepository, PropertyRepository};
use crate::models::{
    CreatePropertyInput, Property, PropertyFilter, PropertyStatus, PropertyWithOwner,
    UpdatePropertyInput, User,
};

/// Page size bounds for search
const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 50;

#[derive(Debug, thiserror::Error)]
pub enum PropertyServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Listing not found")]
    NotFound,

    #[error("Not allowed to modify this listing")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct PropertyService {
    property_repo: Arc<dyn PropertyRepository>,
    audit_repo: Arc<dyn AuditRepository>,
}

impl PropertyService {
    pub fn new(
        property_repo: Arc<dyn PropertyRepository>,
        audit_repo: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            property_repo,
            audit_repo,
        }
    }

    /// Search published listings. Limit and offset are clamped before the
    /// filter reaches the repository.
    pub async fn search(
        &self,
        mut filter: PropertyFilter,
    ) -> Result<(Vec<Property>, i64), PropertyServiceError> {
        if filter.limit <= 0 {
            filter.limit = DEFAULT_PAGE_SIZE;
        }
        filter.limit = filter.limit.min(MAX_PAGE_SIZE);
        filter.offset = filter.offset.max(0);

        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            if min > max {
                return Err(PropertyServiceError::Validation(
                    "min_price cannot exceed max_price".into(),
                ));
            }
        }

        Ok(self.property_repo.search(&filter).await?)
    }

    pub async fn get(&self, id: i64) -> Result<PropertyWithOwner, PropertyServiceError> {
        self.property_repo
            .get_active_with_owner(id)
            .await?
            .ok_or(PropertyServiceError::NotFound)
    }

    pub async fn list_mine(&self, owner_id: i64) -> Result<Vec<Property>, PropertyServiceError> {
        Ok(self.property_repo.list_by_owner(owner_id).await?)
    }

    /// Create a listing. Only owners (and admins) publish; new listings
    /// start pending moderation.
    pub async fn create(
        &self,
        user: &User,
        input: CreatePropertyInput,
    ) -> Result<Property, PropertyServiceError> {
        if !user.is_owner() {
            return Err(PropertyServiceError::Forbidden);
        }
        if input.title.trim().is_empty() {
            return Err(PropertyServiceError::Validation("Title is required".into()));
        }
        if input.address.trim().is_empty() {
            return Err(PropertyServiceError::Validation(
                "Address is required".into(),
            ));
        }
        if input.price <= 0.0 {
            return Err(PropertyServiceError::Validation(
                "Price must be positive".into(),
            ));
        }
        if input.bedrooms < 0 || input.bathrooms < 0 {
            return Err(PropertyServiceError::Validation(
                "Rooms cannot be negative".into(),
            ));
        }

        let property = self.property_repo.create(user.id, &input).await?;
        tracing::info!(property_id = property.id, owner_id = user.id, "listing created");
        Ok(property)
    }

    pub async fn update(
        &self,
        user: &User,
        id: i64,
        input: UpdatePropertyInput,
    ) -> Result<Property, PropertyServiceError> {
        self.authorize(user, id).await?;

        if let Some(price) = input.price {
            if price <= 0.0 {
                return Err(PropertyServiceError::Validation(
                    "Price must be positive".into(),
                ));
            }
        }
        if let Some(title) = &input.title {
            if title.trim().is_empty() {
                return Err(PropertyServiceError::Validation(
                    "Title cannot be empty".into(),
                ));
            }
        }

        Ok(self.property_repo.update(id, &input).await?)
    }

    pub async fn delete(&self, user: &User, id: i64) -> Result<(), PropertyServiceError> {
        self.authorize(user, id).await?;

        if !self.property_repo.soft_delete(id).await? {
            return Err(PropertyServiceError::NotFound);
        }
        tracing::info!(property_id = id, user_id = user.id, "listing deleted");
        Ok(())
    }

    /// Publish a batch of pending listings (admin moderation). Records an
    /// audit entry with the affected ids.
    pub async fn batch_publish(
        &self,
        admin: &User,
        ids: &[i64],
    ) -> Result<u64, PropertyServiceError> {
        if !admin.is_admin() {
            return Err(PropertyServiceError::Forbidden);
        }
        if ids.is_empty() {
            return Err(PropertyServiceError::Validation(
                "No listing ids given".into(),
            ));
        }

        let changed = self
            .property_repo
            .set_status_batch(ids, PropertyStatus::Published)
            .await?;

        self.audit_repo
            .record(
                Some(admin.id),
                "batch_publish",
                "property",
                None,
                Some(&format!("ids={:?} changed={}", ids, changed)),
            )
            .await?;

        tracing::info!(admin_id = admin.id, changed, "batch publish");
        Ok(changed)
    }

    /// NotFound before Forbidden so probing cannot distinguish hidden ids.
    async fn authorize(&self, user: &User, id: i64) -> Result<Property, PropertyServiceError> {
        let property = self
            .property_repo
            .get_by_id(id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(PropertyServiceError::NotFound)?;

        if property.owner_id != user.id && !user.is_admin() {
            return Err(PropertyServiceError::Forbidden);
        }
        Ok(property)
    }
}
