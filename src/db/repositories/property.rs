//! Property repository
//!
//! Listing storage and search. The search filter is compiled into a WHERE
//! clause with positional placeholders; the ORDER BY clause always comes
//! from the closed [`crate::models::PropertySort`] enum, never from user
//! input.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

use crate::db::{BindValue, QueryExecutor};
use crate::models::{
    CreatePropertyInput, Operation, Property, PropertyFilter, PropertyStatus, PropertyType,
    PropertyWithOwner, UpdatePropertyInput,
};

#[async_trait]
pub trait PropertyRepository: Send + Sync {
    /// Search published, active listings; returns the page plus the total
    /// match count
    async fn search(&self, filter: &PropertyFilter) -> Result<(Vec<Property>, i64)>;

    /// Get an active listing with owner contact info
    async fn get_active_with_owner(&self, id: i64) -> Result<Option<PropertyWithOwner>>;

    /// Get a listing regardless of status (ownership checks)
    async fn get_by_id(&self, id: i64) -> Result<Option<Property>>;

    /// All listings of one owner, soft-deleted excluded
    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Property>>;

    async fn create(&self, owner_id: i64, input: &CreatePropertyInput) -> Result<Property>;

    /// Apply the non-None fields of the input
    async fn update(&self, id: i64, input: &UpdatePropertyInput) -> Result<Property>;

    /// Soft delete; returns false when no live row matched
    async fn soft_delete(&self, id: i64) -> Result<bool>;

    /// Move a batch of listings to a new status; returns rows changed
    async fn set_status_batch(&self, ids: &[i64], status: PropertyStatus) -> Result<u64>;
}

pub struct SqlxPropertyRepository {
    executor: QueryExecutor,
}

impl SqlxPropertyRepository {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    pub fn shared(executor: QueryExecutor) -> Arc<dyn PropertyRepository> {
        Arc::new(Self::new(executor))
    }
}

#[async_trait]
impl PropertyRepository for SqlxPropertyRepository {
    async fn search(&self, filter: &PropertyFilter) -> Result<(Vec<Property>, i64)> {
        let (where_clause, params) = build_search_where(filter);

        let count_sql = format!(
            "SELECT COUNT(*) as count FROM properties p WHERE {}",
            where_clause
        );
        let count_row = self
            .executor
            .fetch_one(&count_sql, &params)
            .await
            .context("Failed to count listings")?;
        let total: i64 = count_row.get("count");

        let mut page_params = params;
        page_params.push(filter.limit.into());
        page_params.push(filter.offset.into());

        let page_sql = format!(
            "{} WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
            SELECT_PROPERTY,
            where_clause,
            filter.sort.order_clause()
        );
        let rows = self
            .executor
            .fetch_all(&page_sql, &page_params)
            .await
            .context("Failed to search listings")?;

        let properties = rows.iter().map(row_to_property).collect::<Result<Vec<_>>>()?;
        Ok((properties, total))
    }

    async fn get_active_with_owner(&self, id: i64) -> Result<Option<PropertyWithOwner>> {
        let sql = format!(
            r#"
            {}, u.name as owner_name, u.email as owner_email, u.phone as owner_phone
            FROM properties p
            JOIN users u ON u.id = p.owner_id
            WHERE p.id = ? AND p.is_active = 1
            "#,
            SELECT_PROPERTY_COLUMNS
        );
        let row = self
            .executor
            .fetch_optional(&sql, &[id.into()])
            .await
            .context("Failed to get listing")?;

        row.map(|row| {
            Ok(PropertyWithOwner {
                property: row_to_property(&row)?,
                owner_name: row.get("owner_name"),
                owner_email: row.get("owner_email"),
                owner_phone: row.get("owner_phone"),
            })
        })
        .transpose()
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Property>> {
        let row = self
            .executor
            .fetch_optional(
                &format!("{} WHERE p.id = ?", SELECT_PROPERTY),
                &[id.into()],
            )
            .await
            .context("Failed to get listing")?;

        row.map(|row| row_to_property(&row)).transpose()
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Property>> {
        let rows = self
            .executor
            .fetch_all(
                &format!(
                    "{} WHERE p.owner_id = ? AND p.is_active = 1 ORDER BY p.created_at DESC",
                    SELECT_PROPERTY
                ),
                &[owner_id.into()],
            )
            .await
            .context("Failed to list owner listings")?;

        rows.iter().map(row_to_property).collect()
    }

    async fn create(&self, owner_id: i64, input: &CreatePropertyInput) -> Result<Property> {
        let now = Utc::now();
        let currency = input.currency.clone().unwrap_or_else(|| "CLP".to_string());
        // The stored image doubles as its own thumbnail
        let thumbnail_url = input.image_url.clone();

        let result = self
            .executor
            .execute(
                r#"
                INSERT INTO properties (
                    owner_id, title, description, property_type, operation, price, currency,
                    address, commune, city, region, bedrooms, bathrooms, area_m2,
                    image_url, thumbnail_url, status, is_active, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
                "#,
                &[
                    owner_id.into(),
                    input.title.as_str().into(),
                    input.description.clone().into(),
                    input.property_type.to_string().into(),
                    input.operation.to_string().into(),
                    input.price.into(),
                    currency.as_str().into(),
                    input.address.as_str().into(),
                    input.commune.clone().into(),
                    input.city.clone().into(),
                    input.region.clone().into(),
                    input.bedrooms.into(),
                    input.bathrooms.into(),
                    input.area_m2.into(),
                    input.image_url.clone().into(),
                    thumbnail_url.into(),
                    PropertyStatus::Pending.to_string().into(),
                    now.into(),
                    now.into(),
                ],
            )
            .await
            .context("Failed to create listing")?;

        self.get_by_id(result.last_insert_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Listing not found after insert"))
    }

    async fn update(&self, id: i64, input: &UpdatePropertyInput) -> Result<Property> {
        let mut sets: Vec<&str> = Vec::new();
        let mut params: Vec<BindValue> = Vec::new();

        if let Some(title) = &input.title {
            sets.push("title = ?");
            params.push(title.as_str().into());
        }
        if let Some(description) = &input.description {
            sets.push("description = ?");
            params.push(description.as_str().into());
        }
        if let Some(price) = input.price {
            sets.push("price = ?");
            params.push(price.into());
        }
        if let Some(address) = &input.address {
            sets.push("address = ?");
            params.push(address.as_str().into());
        }
        if let Some(commune) = &input.commune {
            sets.push("commune = ?");
            params.push(commune.as_str().into());
        }
        if let Some(city) = &input.city {
            sets.push("city = ?");
            params.push(city.as_str().into());
        }
        if let Some(region) = &input.region {
            sets.push("region = ?");
            params.push(region.as_str().into());
        }
        if let Some(bedrooms) = input.bedrooms {
            sets.push("bedrooms = ?");
            params.push(bedrooms.into());
        }
        if let Some(bathrooms) = input.bathrooms {
            sets.push("bathrooms = ?");
            params.push(bathrooms.into());
        }
        if let Some(area_m2) = input.area_m2 {
            sets.push("area_m2 = ?");
            params.push(area_m2.into());
        }
        if let Some(image_url) = &input.image_url {
            sets.push("image_url = ?");
            params.push(image_url.as_str().into());
            sets.push("thumbnail_url = ?");
            params.push(image_url.as_str().into());
        }

        if !sets.is_empty() {
            sets.push("updated_at = ?");
            params.push(Utc::now().into());
            params.push(id.into());

            let sql = format!("UPDATE properties SET {} WHERE id = ?", sets.join(", "));
            self.executor
                .execute(&sql, &params)
                .await
                .context("Failed to update listing")?;
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Listing not found after update"))
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let result = self
            .executor
            .execute(
                "UPDATE properties SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1",
                &[Utc::now().into(), id.into()],
            )
            .await
            .context("Failed to delete listing")?;
        Ok(result.rows_affected > 0)
    }

    async fn set_status_batch(&self, ids: &[i64], status: PropertyStatus) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "UPDATE properties SET status = ?, updated_at = ? WHERE id IN ({})",
            placeholders
        );

        let mut params: Vec<BindValue> = vec![status.to_string().into(), Utc::now().into()];
        params.extend(ids.iter().map(|&id| BindValue::from(id)));

        let result = self
            .executor
            .execute(&sql, &params)
            .await
            .context("Failed to update listing statuses")?;
        Ok(result.rows_affected)
    }
}

const SELECT_PROPERTY_COLUMNS: &str = r#"
    SELECT p.id, p.owner_id, p.title, p.description, p.property_type, p.operation,
           p.price, p.currency, p.address, p.commune, p.city, p.region,
           p.bedrooms, p.bathrooms, p.area_m2, p.image_url, p.thumbnail_url,
           p.status, p.is_active, p.created_at, p.updated_at
"#;

const SELECT_PROPERTY: &str = r#"
    SELECT p.id, p.owner_id, p.title, p.description, p.property_type, p.operation,
           p.price, p.currency, p.address, p.commune, p.city, p.region,
           p.bedrooms, p.bathrooms, p.area_m2, p.image_url, p.thumbnail_url,
           p.status, p.is_active, p.created_at, p.updated_at
    FROM properties p
"#;

/// Compile the filter into a WHERE clause and its bind values.
fn build_search_where(filter: &PropertyFilter) -> (String, Vec<BindValue>) {
    let mut clauses: Vec<&str> = vec!["p.is_active = 1", "p.status = 'published'"];
    let mut params: Vec<BindValue> = Vec::new();

    if let Some(property_type) = filter.property_type {
        clauses.push("p.property_type = ?");
        params.push(property_type.to_string().into());
    }
    if let Some(operation) = filter.operation {
        clauses.push("p.operation = ?");
        params.push(operation.to_string().into());
    }
    if let Some(min_price) = filter.min_price {
        clauses.push("p.price >= ?");
        params.push(min_price.into());
    }
    if let Some(max_price) = filter.max_price {
        clauses.push("p.price <= ?");
        params.push(max_price.into());
    }
    if let Some(min_bedrooms) = filter.min_bedrooms {
        clauses.push("p.bedrooms >= ?");
        params.push(min_bedrooms.into());
    }
    if let Some(min_bathrooms) = filter.min_bathrooms {
        clauses.push("p.bathrooms >= ?");
        params.push(min_bathrooms.into());
    }
    if let Some(min_area) = filter.min_area {
        clauses.push("p.area_m2 >= ?");
        params.push(min_area.into());
    }
    if let Some(max_area) = filter.max_area {
        clauses.push("p.area_m2 <= ?");
        params.push(max_area.into());
    }
    if let Some(location) = &filter.location {
        clauses.push("(p.address LIKE ? OR p.commune LIKE ? OR p.city LIKE ?)");
        let pattern = format!("%{}%", location);
        params.push(pattern.as_str().into());
        params.push(pattern.as_str().into());
        params.push(pattern.into());
    }

    (clauses.join(" AND "), params)
}

fn row_to_property(row: &SqliteRow) -> Result<Property> {
    let type_str: String = row.get("property_type");
    let operation_str: String = row.get("operation");
    let status_str: String = row.get("status");

    Ok(Property {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        description: row.get("description"),
        property_type: PropertyType::from_str(&type_str)
            .with_context(|| format!("Invalid property type in database: {}", type_str))?,
        operation: Operation::from_str(&operation_str)
            .with_context(|| format!("Invalid operation in database: {}", operation_str))?,
        price: row.get("price"),
        currency: row.get("currency"),
        address: row.get("address"),
        commune: row.get("commune"),
        city: row.get("city"),
        region: row.get("region"),
        bedrooms: row.get("bedrooms"),
        bathrooms: row.get("bathrooms"),
        area_m2: row.get("area_m2"),
        image_url: row.get("image_url"),
        thumbnail_url: row.get("thumbnail_url"),
        status: PropertyStatus::from_str(&status_str)
            .with_context(|| format!("Invalid status in database: {}", status_str))?,
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seed_user, setup_executor};
    use crate::models::{PropertySort, UserRole};

    fn sample_input(title: &str, price: f64) -> CreatePropertyInput {
        CreatePropertyInput {
            title: title.to_string(),
            description: None,
            property_type: PropertyType::Apartment,
            operation: Operation::Rent,
            price,
            currency: None,
            address: "Calle Falsa 123".to_string(),
            commune: Some("Ñuñoa".to_string()),
            city: Some("Santiago".to_string()),
            region: None,
            bedrooms: 2,
            bathrooms: 1,
            area_m2: Some(60.0),
            image_url: None,
        }
    }

    fn default_filter() -> PropertyFilter {
        PropertyFilter {
            limit: 20,
            offset: 0,
            ..Default::default()
        }
    }

    async fn publish(repo: &SqlxPropertyRepository, id: i64) {
        repo.set_status_batch(&[id], PropertyStatus::Published)
            .await
            .expect("Failed to publish");
    }

    #[tokio::test]
    async fn test_create_starts_pending() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "owner@example.com", UserRole::Owner).await;
        let repo = SqlxPropertyRepository::new(executor);

        let property = repo
            .create(owner.id, &sample_input("Depto Ñuñoa", 400_000.0))
            .await
            .expect("Failed to create");

        assert!(property.id > 0);
        assert_eq!(property.status, PropertyStatus::Pending);
        assert_eq!(property.currency, "CLP");
        assert!(property.is_active);
    }

    #[tokio::test]
    async fn test_search_only_returns_published_active() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "owner@example.com", UserRole::Owner).await;
        let repo = SqlxPropertyRepository::new(executor);

        let pending = repo
            .create(owner.id, &sample_input("Pending", 100_000.0))
            .await
            .expect("create");
        let published = repo
            .create(owner.id, &sample_input("Published", 200_000.0))
            .await
            .expect("create");
        let deleted = repo
            .create(owner.id, &sample_input("Deleted", 300_000.0))
            .await
            .expect("create");

        publish(&repo, published.id).await;
        publish(&repo, deleted.id).await;
        repo.soft_delete(deleted.id).await.expect("delete");

        let (results, total) = repo.search(&default_filter()).await.expect("search");
        assert_eq!(total, 1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, published.id);
        assert_ne!(results[0].id, pending.id);
    }

    #[tokio::test]
    async fn test_search_filters_combine() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "owner@example.com", UserRole::Owner).await;
        let repo = SqlxPropertyRepository::new(executor);

        let cheap = repo
            .create(owner.id, &sample_input("Cheap", 250_000.0))
            .await
            .expect("create");
        let mid = repo
            .create(owner.id, &sample_input("Mid", 500_000.0))
            .await
            .expect("create");
        let pricey = repo
            .create(owner.id, &sample_input("Pricey", 900_000.0))
            .await
            .expect("create");
        for p in [&cheap, &mid, &pricey] {
            publish(&repo, p.id).await;
        }

        let filter = PropertyFilter {
            min_price: Some(300_000.0),
            max_price: Some(800_000.0),
            ..default_filter()
        };
        let (results, total) = repo.search(&filter).await.expect("search");
        assert_eq!(total, 1);
        assert_eq!(results[0].id, mid.id);
    }

    #[tokio::test]
    async fn test_search_location_substring() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "owner@example.com", UserRole::Owner).await;
        let repo = SqlxPropertyRepository::new(executor);

        let property = repo
            .create(owner.id, &sample_input("Depto", 400_000.0))
            .await
            .expect("create");
        publish(&repo, property.id).await;

        let filter = PropertyFilter {
            location: Some("Ñuñoa".to_string()),
            ..default_filter()
        };
        let (results, _) = repo.search(&filter).await.expect("search");
        assert_eq!(results.len(), 1);

        let filter = PropertyFilter {
            location: Some("Valparaíso".to_string()),
            ..default_filter()
        };
        let (results, _) = repo.search(&filter).await.expect("search");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_sort_price_asc() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "owner@example.com", UserRole::Owner).await;
        let repo = SqlxPropertyRepository::new(executor);

        for (title, price) in [("B", 500_000.0), ("A", 250_000.0), ("C", 750_000.0)] {
            let p = repo
                .create(owner.id, &sample_input(title, price))
                .await
                .expect("create");
            publish(&repo, p.id).await;
        }

        let filter = PropertyFilter {
            sort: PropertySort::PriceAsc,
            ..default_filter()
        };
        let (results, _) = repo.search(&filter).await.expect("search");
        let prices: Vec<f64> = results.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![250_000.0, 500_000.0, 750_000.0]);
    }

    #[tokio::test]
    async fn test_search_pagination() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "owner@example.com", UserRole::Owner).await;
        let repo = SqlxPropertyRepository::new(executor);

        for i in 0..5 {
            let p = repo
                .create(owner.id, &sample_input(&format!("P{}", i), 100_000.0))
                .await
                .expect("create");
            publish(&repo, p.id).await;
        }

        let filter = PropertyFilter {
            limit: 2,
            offset: 4,
            ..default_filter()
        };
        let (results, total) = repo.search(&filter).await.expect("search");
        assert_eq!(total, 5);
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_get_active_with_owner() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "contact@example.com", UserRole::Owner).await;
        let repo = SqlxPropertyRepository::new(executor);

        let property = repo
            .create(owner.id, &sample_input("Con dueño", 400_000.0))
            .await
            .expect("create");

        let detail = repo
            .get_active_with_owner(property.id)
            .await
            .expect("get")
            .expect("should exist");
        assert_eq!(detail.owner_email, "contact@example.com");

        repo.soft_delete(property.id).await.expect("delete");
        let gone = repo.get_active_with_owner(property.id).await.expect("get");
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn test_partial_update() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "owner@example.com", UserRole::Owner).await;
        let repo = SqlxPropertyRepository::new(executor);

        let property = repo
            .create(owner.id, &sample_input("Original", 400_000.0))
            .await
            .expect("create");

        let updated = repo
            .update(
                property.id,
                &UpdatePropertyInput {
                    price: Some(420_000.0),
                    ..Default::default()
                },
            )
            .await
            .expect("update");

        assert_eq!(updated.price, 420_000.0);
        // Untouched fields survive
        assert_eq!(updated.title, "Original");
        assert_eq!(updated.bedrooms, 2);
    }

    #[tokio::test]
    async fn test_soft_delete_is_idempotent_signal() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "owner@example.com", UserRole::Owner).await;
        let repo = SqlxPropertyRepository::new(executor);

        let property = repo
            .create(owner.id, &sample_input("Borrar", 400_000.0))
            .await
            .expect("create");

        assert!(repo.soft_delete(property.id).await.expect("delete"));
        assert!(!repo.soft_delete(property.id).await.expect("delete again"));
    }

    #[tokio::test]
    async fn test_batch_publish() {
        let executor = setup_executor().await;
        let owner = seed_user(&executor, "owner@example.com", UserRole::Owner).await;
        let repo = SqlxPropertyRepository::new(executor);

        let a = repo
            .create(owner.id, &sample_input("A", 100_000.0))
            .await
            .expect("create");
        let b = repo
            .create(owner.id, &sample_input("B", 200_000.0))
            .await
            .expect("create");

        let changed = repo
            .set_status_batch(&[a.id, b.id], PropertyStatus::Published)
            .await
            .expect("batch");
        assert_eq!(changed, 2);

        let fetched = repo.get_by_id(a.id).await.expect("get").expect("exists");
        assert_eq!(fetched.status, PropertyStatus::Published);

        let none = repo
            .set_status_batch(&[], PropertyStatus::Published)
            .await
            .expect("empty batch");
        assert_eq!(none, 0);
    }
}
