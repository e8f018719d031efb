//! Application state and service initialization
//!
//! This module centralizes all service initialization and dependency injection,
//! making it easier to manage the application lifecycle and test services.

use std::sync::Arc;

use sqlx::PgPool;

use crate::db::repository::PgSurveyRepository;
use crate::model::Config;
use crate::service::{
    AdminPinGate, AnalyticsService, Authenticator, ProgressAggregator, SubmissionTracker,
    SurveyService, TokenAuthenticator,
};

/// Application state containing all services and shared resources
///
/// Each field is handed to actix-web as app data.
pub struct AppState {
    /// Database connection pool
    pub db_pool: PgPool,
    /// Survey use cases (catalog, submissions, progress)
    pub survey_service: Arc<SurveyService>,
    /// Admin analytics
    pub analytics_service: Arc<AnalyticsService>,
    /// Bearer-token authentication
    pub authenticator: Arc<dyn Authenticator>,
    /// Admin PIN check
    pub admin_gate: AdminPinGate,
}

impl AppState {
    /// Initialize all services and build application state
    ///
    /// This performs:
    /// 1. Database connection and schema initialization
    /// 2. Catalog seeding (skipped when disabled or already seeded)
    /// 3. Service dependency graph construction
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let db_pool = crate::db::create_pool()
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        crate::db::init_schema(&db_pool)
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        let repository = Arc::new(PgSurveyRepository::new(db_pool.clone()));

        crate::db::seed::seed_catalog(repository.as_ref(), &config.seed)
            .await
            .map_err(|e| AppError::Seed(e.to_string()))?;

        Ok(Self {
            db_pool,
            survey_service: Arc::new(Self::build_survey_service(&repository)),
            analytics_service: Arc::new(AnalyticsService::new(
                repository.clone(),
                repository.clone(),
                repository.clone(),
            )),
            authenticator: Arc::new(TokenAuthenticator::new(repository)),
            admin_gate: AdminPinGate::new(config.admin_pin),
        })
    }

    /// Build the survey service with all dependencies
    fn build_survey_service(repository: &Arc<PgSurveyRepository>) -> SurveyService {
        let tracker = SubmissionTracker::new(
            repository.clone(),
            repository.clone(),
            repository.clone(),
        );
        let aggregator = ProgressAggregator::new(
            repository.clone(),
            repository.clone(),
            repository.clone(),
            repository.clone(),
        );

        SurveyService::new(repository.clone(), repository.clone(), tracker, aggregator)
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// Database initialization failed
    #[error("Database initialization failed: {0}")]
    DatabaseInit(String),

    /// Seeding the asset catalog failed
    #[error("Catalog seeding failed: {0}")]
    Seed(String),
}
