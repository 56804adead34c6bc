//! Document service
//!
//! Orchestrates uploads, listings, deletion, and signed access: validates
//! the owning project, applies the file-type policy, routes images through
//! the optimization pipeline, persists metadata, and records view audit
//! rows. All dependencies are injected so tests can substitute a fake
//! backend.

use brix_core::models::{
    DocumentMetadata, DocumentWithProject, ProjectDocument, SignedAccess, StoredFile,
};
use brix_core::policy::{
    classify, is_file_type_allowed, policy_for, select_preset, FileClass, ImageOptions,
};
use brix_core::AppError;
use brix_db::{DocumentFilter, DocumentRepository, DocumentViewRepository, NewDocument, ProjectRepository};
use brix_storage::DocumentStorage;
use std::sync::Arc;
use uuid::Uuid;

/// Expiry applied to backend-signed access URLs. Fixed at this layer; the
/// capability-token TTL is configured separately.
const SIGNED_ACCESS_TTL_SECS: u64 = 3600;

#[derive(Clone)]
pub struct DocumentService {
    storage: Arc<dyn DocumentStorage>,
    documents: DocumentRepository,
    projects: ProjectRepository,
    views: DocumentViewRepository,
}

impl DocumentService {
    pub fn new(
        storage: Arc<dyn DocumentStorage>,
        documents: DocumentRepository,
        projects: ProjectRepository,
        views: DocumentViewRepository,
    ) -> Self {
        Self {
            storage,
            documents,
            projects,
            views,
        }
    }

    /// Store an uploaded file and persist its metadata record.
    ///
    /// The project existence check runs before any storage I/O, so an upload
    /// to a missing project never touches the backend. If metadata insertion
    /// fails after a successful store, the stored object is not rolled back;
    /// the orphan is logged and the error surfaces.
    pub async fn upload(
        &self,
        project_id: Uuid,
        file: StoredFile,
        metadata: DocumentMetadata,
    ) -> Result<ProjectDocument, AppError> {
        if !self.projects.exists(project_id).await? {
            return Err(AppError::NotFound(format!(
                "Project {} not found",
                project_id
            )));
        }

        let class = classify(&file.content_type);
        let policy = policy_for(class);

        if !is_file_type_allowed(&file, Some(policy)) {
            return Err(AppError::InvalidInput(format!(
                "File type {} is not allowed for {} uploads",
                file.content_type, policy.directory
            )));
        }
        if file.size_bytes() > policy.max_size_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "{} bytes exceeds the {} byte limit for {} uploads",
                file.size_bytes(),
                policy.max_size_bytes,
                policy.directory
            )));
        }

        let target_path = format!("{}/{}", policy.directory, project_id);

        let file_url = match class {
            FileClass::Image => {
                let preset = select_preset(metadata.optimize.as_deref());
                let options = ImageOptions::from(preset);
                self.storage.store_image(&file, &target_path, &options).await
            }
            _ => self.storage.store_file(&file, &target_path).await,
        }
        .map_err(|e| AppError::Storage(e.to_string()))?;

        let new = NewDocument {
            project_id,
            file_url: file_url.clone(),
            // The original MIME type, not the transcoded one.
            file_type: file.content_type.clone(),
            document_type: metadata.document_type.unwrap_or_default(),
            access_level: metadata.access_level.unwrap_or_default(),
            security_level: metadata.security_level.unwrap_or_default(),
            title: metadata
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| file.original_name.clone()),
        };

        match self.documents.create(new).await {
            Ok(document) => {
                tracing::info!(
                    document_id = %document.id,
                    project_id = %project_id,
                    file_type = %document.file_type,
                    file_url = %document.file_url,
                    "Document uploaded"
                );
                Ok(document)
            }
            Err(e) => {
                tracing::error!(
                    file_url = %file_url,
                    project_id = %project_id,
                    error = %e,
                    "Metadata insert failed after successful store; stored object is orphaned"
                );
                Err(e)
            }
        }
    }

    pub async fn list(
        &self,
        project_id: Uuid,
        filter: DocumentFilter,
    ) -> Result<Vec<ProjectDocument>, AppError> {
        self.documents.list(project_id, filter).await
    }

    pub async fn get(&self, document_id: Uuid) -> Result<DocumentWithProject, AppError> {
        let document = self
            .documents
            .get(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", document_id)))?;

        let project = self
            .projects
            .get(document.project_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Project {} missing for document {}",
                    document.project_id, document_id
                ))
            })?;

        Ok(DocumentWithProject { document, project })
    }

    /// Remove a document: best-effort backend delete, then view rows, then
    /// the metadata row. The metadata removal is unconditional once reached;
    /// a failed backend delete is logged and never blocks it.
    pub async fn delete(&self, document_id: Uuid) -> Result<(), AppError> {
        let document = self
            .documents
            .get(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", document_id)))?;

        if !self.storage.delete_file(&document.file_url).await {
            tracing::warn!(
                document_id = %document_id,
                file_url = %document.file_url,
                "Backend object could not be removed; continuing with metadata delete"
            );
        }

        self.documents.delete(document_id).await?;

        tracing::info!(document_id = %document_id, "Document deleted");
        Ok(())
    }

    /// Issue a backend-signed URL and record a view audit row.
    ///
    /// Every call inserts exactly one `DocumentView`; repeated calls for
    /// the same document produce one row each. The sign and the audit
    /// insert are not transactional: a crash in between loses the audit
    /// row, not the URL.
    pub async fn signed_access(
        &self,
        document_id: Uuid,
        user_id: Uuid,
        ip_address: Option<String>,
    ) -> Result<SignedAccess, AppError> {
        let document = self
            .documents
            .get(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", document_id)))?;

        let url = self
            .storage
            .get_signed_url(&document.file_url, SIGNED_ACCESS_TTL_SECS)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let view = self.views.record(document_id, user_id, ip_address).await?;
        tracing::info!(
            document_id = %document_id,
            user_id = %user_id,
            view_id = %view.id,
            "Signed access issued"
        );

        Ok(SignedAccess {
            document,
            url,
            expires_in: SIGNED_ACCESS_TTL_SECS,
        })
    }
}
