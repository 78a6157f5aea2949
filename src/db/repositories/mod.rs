//! Repositories
//!
//! One trait + sqlx implementation per entity. Every statement goes through
//! the [`crate::db::QueryExecutor`], so timeout and retry behavior is
//! uniform across the data layer.

pub mod application;
pub mod audit;
pub mod contract;
pub mod favorite;
pub mod message;
pub mod notification;
pub mod passport;
pub mod property;
pub mod session;
pub mod user;
pub mod visit;

pub use application::{ApplicationRepository, SqlxApplicationRepository};
pub use audit::{AuditRepository, SqlxAuditRepository};
pub use contract::{ContractRepository, SqlxContractRepository};
pub use favorite::{FavoriteRepository, SqlxFavoriteRepository};
pub use message::{MessageRepository, SqlxMessageRepository};
pub use notification::{NotificationRepository, SqlxNotificationRepository};
pub use passport::{PassportRepository, SqlxPassportRepository};
pub use property::{PropertyRepository, SqlxPropertyRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
pub use visit::{SqlxVisitRepository, VisitRepository};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::db::{create_test_pool, run_migrations, QueryExecutor};
    use crate::models::{CreatePropertyInput, Operation, PropertyType, User, UserRole};

    /// In-memory executor with the full schema applied.
    pub async fn setup_executor() -> QueryExecutor {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        QueryExecutor::with_defaults(pool)
    }

    /// Insert a user directly and return it with its assigned id.
    pub async fn seed_user(executor: &QueryExecutor, email: &str, role: UserRole) -> User {
        let repo = super::SqlxUserRepository::new(executor.clone());
        let user = User::new(
            format!("User {}", email),
            email.to_string(),
            "$argon2id$test-hash".to_string(),
            role,
        );
        super::UserRepository::create(&repo, &user)
            .await
            .expect("Failed to seed user")
    }

    /// Insert a published listing owned by `owner_id` and return its id.
    pub async fn seed_property(executor: &QueryExecutor, owner_id: i64) -> i64 {
        let repo = super::SqlxPropertyRepository::new(executor.clone());
        let property = super::PropertyRepository::create(
            &repo,
            owner_id,
            &CreatePropertyInput {
                title: "Depto 2D1B Providencia".to_string(),
                description: Some("Luminoso, cerca del metro".to_string()),
                property_type: PropertyType::Apartment,
                operation: Operation::Rent,
                price: 450_000.0,
                currency: None,
                address: "Av. Providencia 1234".to_string(),
                commune: Some("Providencia".to_string()),
                city: Some("Santiago".to_string()),
                region: Some("RM".to_string()),
                bedrooms: 2,
                bathrooms: 1,
                area_m2: Some(58.0),
                image_url: None,
            },
        )
        .await
        .expect("Failed to seed property");

        super::PropertyRepository::set_status_batch(
            &repo,
            &[property.id],
            crate::models::PropertyStatus::Published,
        )
        .await
        .expect("Failed to publish property");

        property.id
    }
}
