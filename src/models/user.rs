//! User model
//!
//! Defines the User entity and the role/status enums used for
//! authorization across the marketplace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A registered user.
///
/// Roles separate the two marketplace sides (owners publish, tenants
/// apply); admins moderate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Contact phone, optional
    pub phone: Option<String>,
    /// User role
    pub role: UserRole,
    /// Whether the account may log in
    pub is_active: bool,
    /// Last successful login
    pub last_login_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User. The password must already be hashed
    /// (`services::password::hash_password`).
    pub fn new(name: String, email: String, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Set by the database
            name,
            email,
            password_hash,
            phone: None,
            role,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_owner(&self) -> bool {
        matches!(self.role, UserRole::Admin | UserRole::Owner)
    }
}

/// User role for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Moderates listings and users
    Admin,
    /// Publishes properties
    Owner,
    /// Searches and applies
    Tenant,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Tenant
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Owner => write!(f, "owner"),
            UserRole::Tenant => write!(f, "tenant"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "owner" => Ok(UserRole::Owner),
            "tenant" => Ok(UserRole::Tenant),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// Input for creating a new user (before password hashing)
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    /// Plaintext password (will be hashed)
    pub password: String,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
}

/// Input for updating a user profile
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    /// New password (optional, will be hashed)
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new() {
        let user = User::new(
            "Ana Rojas".to_string(),
            "ana@example.com".to_string(),
            "hashed_password".to_string(),
            UserRole::Owner,
        );

        assert_eq!(user.id, 0);
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.role, UserRole::Owner);
        assert!(user.is_active);
        assert!(user.last_login_at.is_none());
    }

    #[test]
    fn test_role_checks() {
        let admin = User::new("A".into(), "a@x.com".into(), "h".into(), UserRole::Admin);
        let owner = User::new("O".into(), "o@x.com".into(), "h".into(), UserRole::Owner);
        let tenant = User::new("T".into(), "t@x.com".into(), "h".into(), UserRole::Tenant);

        assert!(admin.is_admin());
        assert!(admin.is_owner());
        assert!(!owner.is_admin());
        assert!(owner.is_owner());
        assert!(!tenant.is_owner());
    }

    #[test]
    fn test_user_role_display() {
        assert_eq!(UserRole::Admin.to_string(), "admin");
        assert_eq!(UserRole::Owner.to_string(), "owner");
        assert_eq!(UserRole::Tenant.to_string(), "tenant");
    }

    #[test]
    fn test_user_role_from_str() {
        assert_eq!(UserRole::from_str("admin").unwrap(), UserRole::Admin);
        assert_eq!(UserRole::from_str("OWNER").unwrap(), UserRole::Owner);
        assert_eq!(UserRole::from_str("Tenant").unwrap(), UserRole::Tenant);
        assert!(UserRole::from_str("landlord").is_err());
    }

    #[test]
    fn test_user_role_default() {
        assert_eq!(UserRole::default(), UserRole::Tenant);
    }
}
