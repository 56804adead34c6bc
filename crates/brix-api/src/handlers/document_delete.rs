use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
}

#[utoipa::path(
    delete,
    path = "/documents/{document_id}",
    tag = "documents",
    params(
        ("document_id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document deleted", body = DeleteResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(document_id = %document_id, user_id = %user.user_id))]
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<Uuid>,
    user: AuthUser,
) -> Result<Json<DeleteResponse>, HttpAppError> {
    state.documents.delete(document_id).await?;
    Ok(Json(DeleteResponse {
        message: "Document deleted successfully".to_string(),
    }))
}
