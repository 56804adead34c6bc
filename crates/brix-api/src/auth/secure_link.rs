//! Application-level capability tokens for confidential document delivery.
//!
//! Independent of the storage backend's own URL signing: a token binds one
//! subject to one document for one purpose, so it can gate the embeddable
//! viewer route regardless of which backend serves the bytes. Tokens are
//! compact HS256 JWTs carried in a query parameter.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The only purpose this service issues tokens for.
pub const DOCUMENT_ACCESS_PURPOSE: &str = "document-access";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentAccessClaims {
    /// Subject: the user the capability was issued to.
    pub sub: Uuid,
    pub document_id: Uuid,
    pub purpose: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SecureLinkError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token is bound to a different document")]
    DocumentMismatch,

    #[error("token purpose is not valid for document access")]
    PurposeMismatch,

    #[error("failed to issue token: {0}")]
    Issue(String),
}

/// Issues and validates short-lived document access tokens.
#[derive(Clone)]
pub struct SecureLinkService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
}

impl SecureLinkService {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issue a capability for `user_id` to fetch `document_id`, valid for
    /// the configured TTL.
    pub fn issue(&self, document_id: Uuid, user_id: Uuid) -> Result<String, SecureLinkError> {
        self.issue_with_ttl(document_id, user_id, self.ttl_secs as i64)
    }

    fn issue_with_ttl(
        &self,
        document_id: Uuid,
        user_id: Uuid,
        ttl_secs: i64,
    ) -> Result<String, SecureLinkError> {
        let now = Utc::now().timestamp();
        let claims = DocumentAccessClaims {
            sub: user_id,
            document_id,
            purpose: DOCUMENT_ACCESS_PURPOSE.to_string(),
            iat: now,
            exp: now + ttl_secs,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| SecureLinkError::Issue(e.to_string()))
    }

    /// Verify signature and expiry, then check the token is bound to the
    /// requested document with the document-access purpose. A token issued
    /// for one document never authorizes another.
    pub fn validate(
        &self,
        token: &str,
        document_id: Uuid,
    ) -> Result<DocumentAccessClaims, SecureLinkError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let data = decode::<DocumentAccessClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SecureLinkError::Expired,
                _ => SecureLinkError::Invalid(e.to_string()),
            })?;

        let claims = data.claims;
        if claims.purpose != DOCUMENT_ACCESS_PURPOSE {
            return Err(SecureLinkError::PurposeMismatch);
        }
        if claims.document_id != document_id {
            return Err(SecureLinkError::DocumentMismatch);
        }
        Ok(claims)
    }
}
