//! Application wiring: database pool, storage backend, services, routes.

pub mod routes;
pub mod server;

use crate::auth::secure_link::SecureLinkService;
use crate::auth::AuthTokenVerifier;
use crate::services::document::DocumentService;
use crate::state::AppState;
use axum::Router;
use brix_core::Config;
use brix_db::{DocumentRepository, DocumentViewRepository, ProjectRepository};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router), anyhow::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    let storage = brix_storage::create_storage(&config).await?;

    let documents = DocumentService::new(
        storage.clone(),
        DocumentRepository::new(pool.clone()),
        ProjectRepository::new(pool.clone()),
        DocumentViewRepository::new(pool.clone()),
    );

    let state = Arc::new(AppState {
        secure_links: SecureLinkService::new(
            &config.secure_link_secret,
            config.secure_link_ttl_secs,
        ),
        auth: AuthTokenVerifier::new(&config.jwt_secret),
        http: reqwest::Client::new(),
        storage,
        documents,
        config,
    });

    let router = routes::build_router(state.clone());
    Ok((state, router))
}
