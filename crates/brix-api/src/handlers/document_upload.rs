use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use brix_core::models::{DocumentMetadata, ProjectDocument, StoredFile};
use brix_core::AppError;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub document: ProjectDocument,
}

/// Pull the single file field plus optional metadata fields out of the
/// multipart body.
async fn parse_multipart(
    mut multipart: Multipart,
) -> Result<(StoredFile, DocumentMetadata), AppError> {
    let mut file: Option<StoredFile> = None;
    let mut metadata = DocumentMetadata::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let original_name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| "file".to_string());
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Failed to read file: {}", e)))?;
                file = Some(StoredFile {
                    original_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            "document_type" => {
                let value = text_field(field, "document_type").await?;
                metadata.document_type = Some(
                    value
                        .parse()
                        .map_err(|e: anyhow::Error| AppError::InvalidInput(e.to_string()))?,
                );
            }
            "access_level" => {
                let value = text_field(field, "access_level").await?;
                metadata.access_level = Some(
                    value
                        .parse()
                        .map_err(|e: anyhow::Error| AppError::InvalidInput(e.to_string()))?,
                );
            }
            "security_level" => {
                let value = text_field(field, "security_level").await?;
                metadata.security_level = Some(
                    value
                        .parse()
                        .map_err(|e: anyhow::Error| AppError::InvalidInput(e.to_string()))?,
                );
            }
            "title" => {
                metadata.title = Some(text_field(field, "title").await?);
            }
            "optimize" => {
                metadata.optimize = Some(text_field(field, "optimize").await?);
            }
            // unknown fields are ignored
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;
    Ok((file, metadata))
}

async fn text_field(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid {} field: {}", name, e)))
}

#[utoipa::path(
    post,
    path = "/projects/{project_id}/documents",
    tag = "documents",
    params(
        ("project_id" = Uuid, Path, description = "Owning project ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document uploaded", body = UploadResponse),
        (status = 400, description = "No file, disallowed type, or oversize", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(project_id = %project_id, user_id = %user.user_id))]
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), HttpAppError> {
    let (file, metadata) = parse_multipart(multipart).await?;

    let document = state.documents.upload(project_id, file, metadata).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Document uploaded successfully".to_string(),
            document,
        }),
    ))
}
