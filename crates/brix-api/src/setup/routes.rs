use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Json, Router};
use brix_core::policy::{policy_for, FileClass};
use brix_core::StorageStrategy;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub fn build_router(state: Arc<AppState>) -> Router {
    // The largest accepted class (video) plus multipart framing overhead.
    let body_limit = policy_for(FileClass::Video).max_size_bytes + 1024 * 1024;

    let mut router = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route(
            "/projects/{project_id}/documents",
            post(handlers::document_upload::upload_document)
                .get(handlers::document_list::list_documents),
        )
        // image/video uploads share the document pipeline; classification is
        // MIME-driven, the route is a naming convenience for clients
        .route(
            "/projects/{project_id}/images",
            post(handlers::document_upload::upload_document),
        )
        .route(
            "/projects/{project_id}/videos",
            post(handlers::document_upload::upload_document),
        )
        .route(
            "/documents/{document_id}",
            get(handlers::document_get::get_document)
                .delete(handlers::document_delete::delete_document),
        )
        .route(
            "/documents/{document_id}/access",
            get(handlers::document_access::document_access),
        )
        .route(
            "/api/documents/secure/{document_id}",
            get(handlers::secure_file::secure_file),
        );

    // Local storage URLs point back at this server.
    if state.storage.strategy() == StorageStrategy::Local {
        router = router.nest_service(
            "/uploads",
            ServeDir::new(&state.config.local_storage_path),
        );
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
