//! Bearer authentication and capability-token issuance.
//!
//! `AuthUser` is the minimal authenticated subject the document subsystem
//! needs (audit trail, token binding); role-based route guards live in the
//! surrounding platform, not here.

pub mod secure_link;

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use brix_core::AppError;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    pub sub: Uuid,
    pub role: String,
    pub exp: i64,
}

/// Verifies platform-issued bearer tokens.
#[derive(Clone)]
pub struct AuthTokenVerifier {
    decoding_key: DecodingKey,
}

impl AuthTokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn verify(&self, token: &str) -> Result<AuthClaims, AppError> {
        decode::<AuthClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid bearer token: {}", e)))
    }
}

/// Authenticated request subject.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = HttpAppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Missing authorization header".to_string(),
                ))
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            HttpAppError(AppError::Unauthorized(
                "Authorization header is not a bearer token".to_string(),
            ))
        })?;

        let claims = state.auth.verify(token)?;
        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_for(secret: &str, sub: Uuid, exp_offset: i64) -> String {
        let claims = AuthClaims {
            sub,
            role: "partner".to_string(),
            exp: chrono::Utc::now().timestamp() + exp_offset,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_valid_token() {
        let verifier = AuthTokenVerifier::new("secret");
        let user_id = Uuid::new_v4();
        let claims = verifier.verify(&token_for("secret", user_id, 3600)).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, "partner");
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let verifier = AuthTokenVerifier::new("secret");
        let result = verifier.verify(&token_for("other-secret", Uuid::new_v4(), 3600));
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_verify_rejects_expired() {
        let verifier = AuthTokenVerifier::new("secret");
        let result = verifier.verify(&token_for("secret", Uuid::new_v4(), -3600));
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
