//! User service
//!
//! Registration, login, session validation and profile updates. Passwords
//! are never stored or compared in plaintext; sessions are opaque bearer
//! tokens with a server-side expiry.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, UpdateUserInput, User, UserRole};
use crate::services::password::{hash_password, verify_password};

/// Default session lifetime
const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

/// Minimum password length for registration
const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Session expired")]
    SessionExpired,

    #[error("Session not found")]
    SessionNotFound,

    #[error("User not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Registration input
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub accept_terms: bool,
}

/// Login input
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_ttl_hours: i64,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
        }
    }

    /// Register a new account and open a session for it.
    ///
    /// The admin role can never be self-assigned; an unknown or missing
    /// role falls back to tenant.
    pub async fn register(
        &self,
        input: RegisterInput,
    ) -> Result<(User, Session), UserServiceError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(UserServiceError::Validation("Name is required".into()));
        }
        let email = input.email.trim().to_lowercase();
        if !EMAIL_RE.is_match(&email) {
            return Err(UserServiceError::Validation("Invalid email format".into()));
        }
        if input.password.len() < MIN_PASSWORD_LEN {
            return Err(UserServiceError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if !input.accept_terms {
            return Err(UserServiceError::Validation(
                "Terms must be accepted".into(),
            ));
        }

        if self.user_repo.get_by_email(&email).await?.is_some() {
            return Err(UserServiceError::EmailTaken);
        }

        let role = match input.role {
            Some(UserRole::Owner) => UserRole::Owner,
            _ => UserRole::Tenant,
        };

        let password_hash = hash_password(&input.password)?;
        let mut user = User::new(name.to_string(), email, password_hash, role);
        user.phone = input.phone.filter(|p| !p.trim().is_empty());

        let user = self.user_repo.create(&user).await?;
        let session = self.open_session(&user).await?;

        tracing::info!(user_id = user.id, role = %user.role, "user registered");
        Ok((user, session))
    }

    /// Authenticate and open a session.
    pub async fn login(&self, input: LoginInput) -> Result<(User, Session), UserServiceError> {
        let email = input.email.trim().to_lowercase();
        let user = self
            .user_repo
            .get_by_email(&email)
            .await?
            .ok_or(UserServiceError::InvalidCredentials)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(UserServiceError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(UserServiceError::AccountDisabled);
        }

        self.user_repo.touch_last_login(user.id).await?;
        let session = self.open_session(&user).await?;

        tracing::info!(user_id = user.id, "user logged in");
        Ok((user, session))
    }

    /// Resolve a bearer token to its user.
    ///
    /// Expired sessions are deleted on sight.
    pub async fn validate_session(&self, token: &str) -> Result<User, UserServiceError> {
        let session = self
            .session_repo
            .get(token)
            .await?
            .ok_or(UserServiceError::SessionNotFound)?;

        if session.is_expired() {
            self.session_repo.delete(token).await?;
            return Err(UserServiceError::SessionExpired);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await?
            .ok_or(UserServiceError::SessionNotFound)?;

        if !user.is_active {
            return Err(UserServiceError::AccountDisabled);
        }

        Ok(user)
    }

    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo.delete(token).await?;
        Ok(())
    }

    pub async fn get_user(&self, id: i64) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_id(id)
            .await?
            .ok_or(UserServiceError::NotFound)
    }

    /// Update name, phone and optionally the password.
    pub async fn update_profile(
        &self,
        user_id: i64,
        input: UpdateUserInput,
    ) -> Result<User, UserServiceError> {
        let mut user = self.get_user(user_id).await?;

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(UserServiceError::Validation("Name cannot be empty".into()));
            }
            user.name = name;
        }
        if let Some(phone) = input.phone {
            user.phone = Some(phone).filter(|p| !p.trim().is_empty());
        }
        if let Some(password) = input.password {
            if password.len() < MIN_PASSWORD_LEN {
                return Err(UserServiceError::Validation(format!(
                    "Password must be at least {} characters",
                    MIN_PASSWORD_LEN
                )));
            }
            user.password_hash = hash_password(&password)?;
        }

        Ok(self.user_repo.update(&user).await?)
    }

    /// Paginated user listing (admin).
    pub async fn list_users(
        &self,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<User>, i64), UserServiceError> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);
        Ok(self.user_repo.list(page, per_page).await?)
    }

    /// Enable or disable an account (admin).
    pub async fn set_active(&self, user_id: i64, active: bool) -> Result<(), UserServiceError> {
        // Fails with NotFound before touching anything
        self.get_user(user_id).await?;
        self.user_repo.set_active(user_id, active).await?;
        Ok(())
    }

    async fn open_session(&self, user: &User) -> Result<Session, UserServiceError> {
        let session = Session::new(user.id, self.session_ttl_hours);
        self.session_repo.create(&session).await?;
        Ok(session)
    }
}
