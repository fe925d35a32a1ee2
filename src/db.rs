//! Database bootstrap
//!
//! Builds the control-plane connection pool and creates the domain tables
//! if they don't exist.

use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

/// Create the connection pool and verify it answers
pub async fn init_pool(config: &DatabaseConfig) -> AppResult<Pool> {
    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.user = Some(config.user.clone());
    cfg.password = Some(config.password.clone());
    cfg.dbname = Some(config.database.clone());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    let pool = if config.tls {
        let certs = rustls_native_certs::load_native_certs();
        let mut root_store = rustls::RootCertStore::empty();
        for cert in certs.certs {
            root_store.add(cert).ok();
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();
        let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

        cfg.create_pool(Some(Runtime::Tokio1), tls)
            .map_err(|e| AppError::Config(format!("Failed to create TLS pool: {}", e)))?
    } else {
        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| AppError::Config(format!("Failed to create pool: {}", e)))?
    };

    // Simple test query to verify the connection works
    let client = pool.get().await?;
    client.query_one("SELECT 1", &[]).await?;
    drop(client);

    info!("Database connection pool established (TLS: {})", config.tls);
    Ok(pool)
}

/// Create control-plane tables if they don't exist
pub async fn create_tables(pool: &Pool) -> AppResult<()> {
    let client = pool.get().await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS organizations (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS environments (
                id TEXT PRIMARY KEY,
                organization_id TEXT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                console_url TEXT,
                portal_url TEXT
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS apis (
                id TEXT PRIMARY KEY,
                environment_id TEXT NOT NULL,
                name TEXT NOT NULL,
                version TEXT NOT NULL,
                categories TEXT[] NOT NULL DEFAULT '{}',
                definition JSONB NOT NULL DEFAULT '{}',
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS applications (
                id TEXT PRIMARY KEY,
                environment_id TEXT NOT NULL,
                name TEXT NOT NULL,
                api_key_mode TEXT
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                environment_id TEXT NOT NULL,
                key TEXT NOT NULL,
                name TEXT NOT NULL
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS roles (
                id TEXT PRIMARY KEY,
                organization_id TEXT NOT NULL,
                scope TEXT NOT NULL,
                name TEXT NOT NULL,
                permissions TEXT[] NOT NULL DEFAULT '{}',
                is_default BOOLEAN NOT NULL DEFAULT false
            )",
            &[],
        )
        .await?;

    // Backs the conflict detection in role creation.
    client
        .execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_roles_org_scope_name
             ON roles(organization_id, scope, name)",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS installation (
                id TEXT PRIMARY KEY,
                additional_information JSONB NOT NULL DEFAULT '{}',
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await?;

    // Indexes for the scans the upgraders run
    client
        .execute(
            "CREATE INDEX IF NOT EXISTS idx_apis_environment_id ON apis(environment_id)",
            &[],
        )
        .await?;
    client
        .execute(
            "CREATE INDEX IF NOT EXISTS idx_applications_environment_id
             ON applications(environment_id)",
            &[],
        )
        .await?;
    client
        .execute(
            "CREATE INDEX IF NOT EXISTS idx_categories_environment_id
             ON categories(environment_id)",
            &[],
        )
        .await?;

    info!("Control-plane tables initialized");
    Ok(())
}
