//! Habita - A rental real-estate marketplace backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use habita::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxApplicationRepository, SqlxAuditRepository, SqlxContractRepository,
            SqlxFavoriteRepository, SqlxMessageRepository, SqlxNotificationRepository,
            SqlxPassportRepository, SqlxPropertyRepository, SqlxSessionRepository,
            SqlxUserRepository, SqlxVisitRepository,
        },
        QueryExecutor, RetryPolicy,
    },
    services::{
        ApplicationService, ContractService, FavoriteService, MessageService,
        NotificationService, PassportService, PropertyService, UserService, VisitService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "habita=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Habita marketplace...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!(url = %config.database.url, "Database connected");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Resilient query executor shared by every repository
    let executor = QueryExecutor::new(pool, RetryPolicy::from(&config.query));

    // Create repositories
    let user_repo = SqlxUserRepository::shared(executor.clone());
    let session_repo = SqlxSessionRepository::shared(executor.clone());
    let property_repo = SqlxPropertyRepository::shared(executor.clone());
    let favorite_repo = SqlxFavoriteRepository::shared(executor.clone());
    let visit_repo = SqlxVisitRepository::shared(executor.clone());
    let application_repo = SqlxApplicationRepository::shared(executor.clone());
    let message_repo = SqlxMessageRepository::shared(executor.clone());
    let contract_repo = SqlxContractRepository::shared(executor.clone());
    let notification_repo = SqlxNotificationRepository::shared(executor.clone());
    let passport_repo = SqlxPassportRepository::shared(executor.clone());
    let audit_repo = SqlxAuditRepository::shared(executor.clone());

    // Initialize services
    let user_service = Arc::new(UserService::new(user_repo.clone(), session_repo));
    let property_service = Arc::new(PropertyService::new(
        property_repo.clone(),
        audit_repo.clone(),
    ));
    let favorite_service = Arc::new(FavoriteService::new(
        favorite_repo,
        property_repo.clone(),
    ));
    let visit_service = Arc::new(VisitService::new(
        visit_repo,
        property_repo.clone(),
        notification_repo.clone(),
    ));
    let application_service = Arc::new(ApplicationService::new(
        application_repo,
        property_repo.clone(),
        notification_repo.clone(),
    ));
    let message_service = Arc::new(MessageService::new(message_repo, user_repo.clone()));
    let contract_service = Arc::new(ContractService::new(
        contract_repo,
        property_repo,
        user_repo,
        notification_repo.clone(),
    ));
    let notification_service = Arc::new(NotificationService::new(notification_repo));
    let passport_service = Arc::new(PassportService::new(passport_repo));

    // Build application state
    let state = AppState {
        executor,
        user_service,
        property_service,
        favorite_service,
        visit_service,
        application_service,
        message_service,
        contract_service,
        notification_service,
        passport_service,
        audit_repo,
        upload_config: Arc::new(config.upload.clone()),
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
