use brix_core::models::{AccessLevel, DocumentType, ProjectDocument, SecurityLevel};
use brix_core::AppError;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const DOCUMENT_COLUMNS: &str = "id, project_id, file_url, file_type, document_type, \
     access_level, security_level, title, created_at";

/// Input for a new document row; the id and timestamp are generated here.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub project_id: Uuid,
    pub file_url: String,
    pub file_type: String,
    pub document_type: DocumentType,
    pub access_level: AccessLevel,
    pub security_level: SecurityLevel,
    pub title: String,
}

/// Equality filters for document listings; absent fields do not constrain.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentFilter {
    pub document_type: Option<DocumentType>,
    pub access_level: Option<AccessLevel>,
}

#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewDocument) -> Result<ProjectDocument, AppError> {
        let document = sqlx::query_as::<Postgres, ProjectDocument>(&format!(
            "INSERT INTO project_documents \
                 (id, project_id, file_url, file_type, document_type, access_level, security_level, title, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW()) \
             RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.project_id)
        .bind(&new.file_url)
        .bind(&new.file_type)
        .bind(new.document_type)
        .bind(new.access_level)
        .bind(new.security_level)
        .bind(&new.title)
        .fetch_one(&self.pool)
        .await?;

        Ok(document)
    }

    /// Documents of one project, newest first. Filters are ANDed; no
    /// pagination (the full result set is returned).
    pub async fn list(
        &self,
        project_id: Uuid,
        filter: DocumentFilter,
    ) -> Result<Vec<ProjectDocument>, AppError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {DOCUMENT_COLUMNS} FROM project_documents WHERE project_id = "
        ));
        query.push_bind(project_id);

        if let Some(document_type) = filter.document_type {
            query.push(" AND document_type = ");
            query.push_bind(document_type);
        }
        if let Some(access_level) = filter.access_level {
            query.push(" AND access_level = ");
            query.push_bind(access_level);
        }
        query.push(" ORDER BY created_at DESC");

        let documents = query
            .build_query_as::<ProjectDocument>()
            .fetch_all(&self.pool)
            .await?;

        Ok(documents)
    }

    pub async fn get(&self, document_id: Uuid) -> Result<Option<ProjectDocument>, AppError> {
        let document = sqlx::query_as::<Postgres, ProjectDocument>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM project_documents WHERE id = $1"
        ))
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    /// Remove a document and its view records in one transaction, views
    /// first (foreign-key dependency).
    pub async fn delete(&self, document_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM document_views WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM project_documents WHERE id = $1")
            .bind(document_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
