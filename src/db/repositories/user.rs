//! User repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

use crate::db::QueryExecutor;
use crate::models::{User, UserRole};

/// User data access.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Update name, phone and password hash
    async fn update(&self, user: &User) -> Result<User>;

    /// Record a successful login
    async fn touch_last_login(&self, id: i64) -> Result<()>;

    /// Enable or disable an account
    async fn set_active(&self, id: i64, active: bool) -> Result<()>;

    /// List all users with pagination, newest first
    async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<User>, i64)>;

    /// Count total users
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based user repository.
pub struct SqlxUserRepository {
    executor: QueryExecutor,
}

impl SqlxUserRepository {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    /// Create a shared repository for dependency injection
    pub fn shared(executor: QueryExecutor) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(executor))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let now = Utc::now();
        let result = self
            .executor
            .execute(
                r#"
                INSERT INTO users (name, email, password_hash, phone, role, is_active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
                &[
                    user.name.as_str().into(),
                    user.email.as_str().into(),
                    user.password_hash.as_str().into(),
                    user.phone.clone().into(),
                    user.role.to_string().into(),
                    user.is_active.into(),
                    now.into(),
                    now.into(),
                ],
            )
            .await
            .context("Failed to create user")?;

        let mut created = user.clone();
        created.id = result.last_insert_id;
        created.created_at = now;
        created.updated_at = now;
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = self
            .executor
            .fetch_optional(&format!("{} WHERE id = ?", SELECT_USER), &[id.into()])
            .await
            .context("Failed to get user by ID")?;

        row.map(|row| row_to_user(&row)).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = self
            .executor
            .fetch_optional(&format!("{} WHERE email = ?", SELECT_USER), &[email.into()])
            .await
            .context("Failed to get user by email")?;

        row.map(|row| row_to_user(&row)).transpose()
    }

    async fn update(&self, user: &User) -> Result<User> {
        let now = Utc::now();
        self.executor
            .execute(
                r#"
                UPDATE users
                SET name = ?, phone = ?, password_hash = ?, updated_at = ?
                WHERE id = ?
                "#,
                &[
                    user.name.as_str().into(),
                    user.phone.clone().into(),
                    user.password_hash.as_str().into(),
                    now.into(),
                    user.id.into(),
                ],
            )
            .await
            .context("Failed to update user")?;

        self.get_by_id(user.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found after update"))
    }

    async fn touch_last_login(&self, id: i64) -> Result<()> {
        self.executor
            .execute(
                "UPDATE users SET last_login_at = ? WHERE id = ?",
                &[Utc::now().into(), id.into()],
            )
            .await
            .context("Failed to record login")?;
        Ok(())
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<()> {
        self.executor
            .execute(
                "UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?",
                &[active.into(), Utc::now().into(), id.into()],
            )
            .await
            .context("Failed to set account status")?;
        Ok(())
    }

    async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<User>, i64)> {
        let offset = (page - 1) * per_page;
        let rows = self
            .executor
            .fetch_all(
                &format!("{} ORDER BY created_at DESC LIMIT ? OFFSET ?", SELECT_USER),
                &[per_page.into(), offset.into()],
            )
            .await
            .context("Failed to list users")?;

        let users = rows.iter().map(row_to_user).collect::<Result<Vec<_>>>()?;
        let total = self.count().await?;
        Ok((users, total))
    }

    async fn count(&self) -> Result<i64> {
        let row = self
            .executor
            .fetch_one("SELECT COUNT(*) as count FROM users", &[])
            .await
            .context("Failed to count users")?;
        Ok(row.get("count"))
    }
}

const SELECT_USER: &str = r#"
    SELECT id, name, email, password_hash, phone, role, is_active,
           last_login_at, created_at, updated_at
    FROM users
"#;

fn row_to_user(row: &SqliteRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        phone: row.get("phone"),
        role,
        is_active: row.get("is_active"),
        last_login_at: row.get("last_login_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
