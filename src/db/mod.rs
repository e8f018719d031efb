//! Database module for PostgreSQL persistence

#[cfg(test)]
pub mod memory;
pub mod models;
pub mod repository;
pub mod seed;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::env;

// Environment variable names
const ENV_POSTGRES_HOST: &str = "UMKM_POSTGRES_HOST";
const ENV_POSTGRES_PORT: &str = "UMKM_POSTGRES_PORT";
const ENV_POSTGRES_USER: &str = "UMKM_POSTGRES_USER";
const ENV_POSTGRES_PASSWORD: &str = "UMKM_POSTGRES_PASSWORD";
const ENV_POSTGRES_DB: &str = "UMKM_POSTGRES_DB";

// Default values
const DEFAULT_POSTGRES_HOST: &str = "127.0.0.1";
const DEFAULT_POSTGRES_PORT: &str = "5432";
const DEFAULT_POSTGRES_USER: &str = "umkm";
const DEFAULT_POSTGRES_PASSWORD: &str = "umkm";
const DEFAULT_POSTGRES_DB: &str = "umkm_survey";

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A unique index rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),
}

impl DbError {
    /// Map a unique-index rejection to `UniqueViolation`, anything else to `Connection`
    pub fn from_write(err: sqlx::Error, what: impl Into<String>) -> Self {
        let unique = err
            .as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation());

        if unique {
            DbError::UniqueViolation(what.into())
        } else {
            DbError::Connection(err)
        }
    }
}

/// Create a new database connection pool
pub async fn create_pool() -> Result<PgPool, DbError> {
    let host = env::var(ENV_POSTGRES_HOST).unwrap_or_else(|_| DEFAULT_POSTGRES_HOST.to_string());
    let port = env::var(ENV_POSTGRES_PORT).unwrap_or_else(|_| DEFAULT_POSTGRES_PORT.to_string());
    let user = env::var(ENV_POSTGRES_USER).unwrap_or_else(|_| DEFAULT_POSTGRES_USER.to_string());
    let password =
        env::var(ENV_POSTGRES_PASSWORD).unwrap_or_else(|_| DEFAULT_POSTGRES_PASSWORD.to_string());
    let database = env::var(ENV_POSTGRES_DB).unwrap_or_else(|_| DEFAULT_POSTGRES_DB.to_string());

    let database_url = format!(
        "postgres://{}:{}@{}:{}/{}",
        user, password, host, port, database
    );

    tracing::debug!(host = %host, port = %port, database = %database, "Connecting to PostgreSQL");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    tracing::info!(host = %host, port = %port, "PostgreSQL connection established");

    Ok(pool)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        name TEXT,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS api_tokens (
        token_hash VARCHAR(64) PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS assets (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        description TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS threats (
        id BIGSERIAL PRIMARY KEY,
        asset_id BIGINT NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        description TEXT,
        kind VARCHAR(50) NOT NULL DEFAULT 'other',
        UNIQUE (asset_id, name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS business_processes (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        description TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS threat_business_processes (
        threat_id BIGINT NOT NULL REFERENCES threats(id) ON DELETE CASCADE,
        business_process_id BIGINT NOT NULL REFERENCES business_processes(id) ON DELETE CASCADE,
        explanation TEXT,
        PRIMARY KEY (threat_id, business_process_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS submissions (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users(id),
        asset_id BIGINT NOT NULL REFERENCES assets(id),
        threat_id BIGINT NOT NULL REFERENCES threats(id),
        submitted_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        understand VARCHAR(20),
        UNIQUE (user_id, asset_id, threat_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS risk_inputs (
        id BIGSERIAL PRIMARY KEY,
        submission_id BIGINT NOT NULL UNIQUE REFERENCES submissions(id) ON DELETE CASCADE,
        biaya_pengetahuan INTEGER NOT NULL CHECK (biaya_pengetahuan BETWEEN 1 AND 6),
        pengaruh_kerugian INTEGER NOT NULL CHECK (pengaruh_kerugian BETWEEN 1 AND 6),
        frekuensi_serangan INTEGER NOT NULL CHECK (frekuensi_serangan BETWEEN 1 AND 6),
        pemulihan INTEGER NOT NULL CHECK (pemulihan IN (2, 4, 6)),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS scores (
        id BIGSERIAL PRIMARY KEY,
        submission_id BIGINT NOT NULL UNIQUE REFERENCES submissions(id) ON DELETE CASCADE,
        peluang DOUBLE PRECISION NOT NULL,
        impact DOUBLE PRECISION NOT NULL,
        total INTEGER NOT NULL,
        category VARCHAR(10) NOT NULL,
        threat_description JSONB,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS feedback (
        id BIGSERIAL PRIMARY KEY,
        submission_id BIGINT NOT NULL REFERENCES submissions(id) ON DELETE CASCADE,
        field TEXT NOT NULL,
        value TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS form_progress (
        user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        asset_id BIGINT NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
        status VARCHAR(20) NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (user_id, asset_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_threats_asset_id ON threats(asset_id)",
    "CREATE INDEX IF NOT EXISTS idx_submissions_user_id ON submissions(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_feedback_submission_id ON feedback(submission_id)",
];

/// Initialize database schema
pub async fn init_schema(pool: &PgPool) -> Result<(), DbError> {
    for statement in SCHEMA {
        sqlx::query(*statement).execute(pool).await?;
    }

    tracing::info!("Database schema initialized");

    Ok(())
}
