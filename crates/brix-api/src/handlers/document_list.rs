use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use brix_core::models::ProjectDocument;
use brix_core::AppError;
use brix_db::DocumentFilter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuery {
    pub document_type: Option<String>,
    pub access_level: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListResponse {
    pub documents: Vec<ProjectDocument>,
}

#[utoipa::path(
    get,
    path = "/projects/{project_id}/documents",
    tag = "documents",
    params(
        ("project_id" = Uuid, Path, description = "Owning project ID"),
        ListQuery
    ),
    responses(
        (status = 200, description = "Documents of the project, newest first", body = ListResponse),
        (status = 400, description = "Invalid filter value", body = ErrorResponse)
    )
)]
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    _user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, HttpAppError> {
    let filter = DocumentFilter {
        document_type: query
            .document_type
            .map(|v| v.parse())
            .transpose()
            .map_err(|e: anyhow::Error| AppError::InvalidInput(e.to_string()))?,
        access_level: query
            .access_level
            .map(|v| v.parse())
            .transpose()
            .map_err(|e: anyhow::Error| AppError::InvalidInput(e.to_string()))?,
    };

    let documents = state.documents.list(project_id, filter).await?;
    Ok(Json(ListResponse { documents }))
}
