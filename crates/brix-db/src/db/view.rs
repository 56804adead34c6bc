use brix_core::models::DocumentView;
use brix_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Append-only access audit trail. One row per signed-URL issuance.
#[derive(Clone)]
pub struct DocumentViewRepository {
    pool: PgPool,
}

impl DocumentViewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(
        &self,
        document_id: Uuid,
        user_id: Uuid,
        ip_address: Option<String>,
    ) -> Result<DocumentView, AppError> {
        let view = sqlx::query_as::<Postgres, DocumentView>(
            "INSERT INTO document_views (id, document_id, user_id, ip_address, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) \
             RETURNING id, document_id, user_id, ip_address, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(document_id)
        .bind(user_id)
        .bind(ip_address)
        .fetch_one(&self.pool)
        .await?;

        Ok(view)
    }

    pub async fn count_for_document(&self, document_id: Uuid) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM document_views WHERE document_id = $1")
                .bind(document_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
