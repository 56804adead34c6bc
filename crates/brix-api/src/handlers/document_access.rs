use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::client_ip;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use brix_core::models::SignedAccess;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct AccessResponse {
    #[serde(flatten)]
    pub access: SignedAccess,
    /// Capability token for the embeddable secure viewer route.
    pub token: String,
}

/// Issue signed access to a document.
///
/// Returns both the backend-signed URL and an application capability token
/// for `/api/documents/secure/{id}`. Every call records a view audit row.
#[utoipa::path(
    get,
    path = "/documents/{document_id}/access",
    tag = "documents",
    params(
        ("document_id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Signed access URL and capability token", body = AccessResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers), fields(document_id = %document_id, user_id = %user.user_id))]
pub async fn document_access(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<Uuid>,
    user: AuthUser,
    headers: HeaderMap,
) -> Result<Json<AccessResponse>, HttpAppError> {
    let access = state
        .documents
        .signed_access(document_id, user.user_id, client_ip(&headers))
        .await?;

    let token = state.secure_links.issue(document_id, user.user_id)?;

    Ok(Json(AccessResponse { access, token }))
}
