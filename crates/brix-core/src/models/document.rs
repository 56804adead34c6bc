use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use super::project::Project;

/// Business category of a project document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "document_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Legal,
    Financial,
    Technical,
    Marketing,
    Image,
    Video,
    Other,
}

impl Default for DocumentType {
    fn default() -> Self {
        DocumentType::Other
    }
}

/// Minimum audience allowed to see a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "access_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Public,
    Partner,
    Investor,
    Admin,
}

impl Default for AccessLevel {
    fn default() -> Self {
        AccessLevel::Partner
    }
}

/// What the audience may do with the document once visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "security_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    ViewOnly,
    Download,
    Print,
    FullAccess,
}

impl Default for SecurityLevel {
    fn default() -> Self {
        SecurityLevel::ViewOnly
    }
}

macro_rules! impl_str_conv {
    ($ty:ident, $( $variant:ident => $text:literal ),+ $(,)?) => {
        impl FromStr for $ty {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $( $text => Ok($ty::$variant), )+
                    _ => Err(anyhow::anyhow!(
                        concat!("Invalid ", stringify!($ty), ": {}"),
                        s
                    )),
                }
            }
        }

        impl Display for $ty {
            fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
                match self {
                    $( $ty::$variant => write!(f, $text), )+
                }
            }
        }
    };
}

impl_str_conv!(DocumentType,
    Legal => "legal",
    Financial => "financial",
    Technical => "technical",
    Marketing => "marketing",
    Image => "image",
    Video => "video",
    Other => "other",
);

impl_str_conv!(AccessLevel,
    Public => "public",
    Partner => "partner",
    Investor => "investor",
    Admin => "admin",
);

impl_str_conv!(SecurityLevel,
    ViewOnly => "view_only",
    Download => "download",
    Print => "print",
    FullAccess => "full_access",
);

/// An uploaded file, fully buffered in memory for the duration of the
/// request. The per-class size ceiling bounds the buffer before any
/// transcoding or storage I/O runs.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub original_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl StoredFile {
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// Caller-supplied document metadata accompanying an upload. Every field is
/// optional; defaults are applied at persist time.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DocumentMetadata {
    pub document_type: Option<DocumentType>,
    pub access_level: Option<AccessLevel>,
    pub security_level: Option<SecurityLevel>,
    pub title: Option<String>,
    /// Optimization preset name for image uploads (case-insensitive).
    pub optimize: Option<String>,
}

/// Persisted document record.
///
/// `file_url` is the sole address of the backing object: there is no
/// storage-key column, so backends must be able to re-derive their native
/// key from this URL alone.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct ProjectDocument {
    pub id: Uuid,
    pub project_id: Uuid,
    pub file_url: String,
    /// MIME type of the original upload (not the transcoded output).
    pub file_type: String,
    pub document_type: DocumentType,
    pub access_level: AccessLevel,
    pub security_level: SecurityLevel,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Document plus its owning project, as returned by single-document reads.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DocumentWithProject {
    #[serde(flatten)]
    pub document: ProjectDocument,
    pub project: Project,
}

/// Result of a signed-access request.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SignedAccess {
    pub document: ProjectDocument,
    pub url: String,
    pub expires_in: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_str_roundtrip() {
        assert_eq!(
            "financial".parse::<DocumentType>().unwrap(),
            DocumentType::Financial
        );
        assert_eq!(DocumentType::Legal.to_string(), "legal");
        assert_eq!(
            "view_only".parse::<SecurityLevel>().unwrap(),
            SecurityLevel::ViewOnly
        );
        assert_eq!(SecurityLevel::FullAccess.to_string(), "full_access");
        assert_eq!("ADMIN".parse::<AccessLevel>().unwrap(), AccessLevel::Admin);
        assert!("secret".parse::<AccessLevel>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(DocumentType::default(), DocumentType::Other);
        assert_eq!(AccessLevel::default(), AccessLevel::Partner);
        assert_eq!(SecurityLevel::default(), SecurityLevel::ViewOnly);
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&SecurityLevel::ViewOnly).unwrap();
        assert_eq!(json, "\"view_only\"");
        let parsed: DocumentType = serde_json::from_str("\"marketing\"").unwrap();
        assert_eq!(parsed, DocumentType::Marketing);
    }

    #[test]
    fn test_stored_file_size() {
        let file = StoredFile {
            original_name: "deed.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: vec![0u8; 2048],
        };
        assert_eq!(file.size_bytes(), 2048);
    }
}
