use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Access audit record, inserted every time a signed URL is issued for a
/// document. Rows are removed together with their document.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct DocumentView {
    pub id: Uuid,
    pub document_id: Uuid,
    pub user_id: Uuid,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}
