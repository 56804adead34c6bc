use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use brix_core::models::DocumentWithProject;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct GetResponse {
    pub document: DocumentWithProject,
}

#[utoipa::path(
    get,
    path = "/documents/{document_id}",
    tag = "documents",
    params(
        ("document_id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document with its owning project", body = GetResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<Uuid>,
    _user: AuthUser,
) -> Result<Json<GetResponse>, HttpAppError> {
    let document = state.documents.get(document_id).await?;
    Ok(Json(GetResponse { document }))
}
