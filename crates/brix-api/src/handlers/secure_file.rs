//! Secure document delivery gate.
//!
//! Validates the capability token, writes an audit line, and proxies the
//! already-resolved document content. This endpoint is a policy gate: it
//! never derives storage addresses itself.

use crate::auth::secure_link::SecureLinkError;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
};
use brix_core::AppError;
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/documents/secure/{document_id}",
    tag = "documents",
    params(
        ("document_id" = Uuid, Path, description = "Document ID"),
        ("token" = String, Query, description = "Capability token from the access endpoint")
    ),
    responses(
        (status = 200, description = "Document content, inline, uncacheable"),
        (status = 401, description = "Missing, invalid, or expired token"),
        (status = 403, description = "Token not valid for this document"),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn secure_file(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<Uuid>,
    Query(query): Query<TokenQuery>,
) -> Result<Response, HttpAppError> {
    let token = query.token.ok_or_else(|| {
        HttpAppError(AppError::Unauthorized("Missing access token".to_string()))
    })?;

    let claims = match state.secure_links.validate(&token, document_id) {
        Ok(claims) => claims,
        Err(e) => {
            // expired vs. forged is a log-only distinction; the response
            // body is identical for both
            match &e {
                SecureLinkError::Expired => {
                    tracing::debug!(document_id = %document_id, "Secure link rejected: expired token")
                }
                SecureLinkError::Invalid(reason) => {
                    tracing::warn!(document_id = %document_id, reason = %reason, "Secure link rejected: invalid token")
                }
                other => {
                    tracing::warn!(document_id = %document_id, error = %other, "Secure link rejected")
                }
            }
            return Err(e.into());
        }
    };

    let document = state.documents.get(document_id).await?.document;

    // Audit line before serving anything.
    tracing::info!(
        user_id = %claims.sub,
        document_id = %document_id,
        action = "secure_document_access",
        "Document access granted"
    );

    let upstream = state
        .http
        .get(&document.file_url)
        .send()
        .await
        .map_err(|e| AppError::Storage(format!("Failed to fetch document content: {}", e)))?;

    if !upstream.status().is_success() {
        return Err(AppError::Storage(format!(
            "Document content fetch returned {}",
            upstream.status()
        ))
        .into());
    }

    let stream = upstream
        .bytes_stream()
        .map(|result| result.map_err(std::io::Error::other));

    // Strip quote-breaking characters from the display filename.
    let safe_title: String = document
        .title
        .chars()
        .filter(|c| *c != '"' && *c != '\r' && *c != '\n')
        .collect();

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, document.file_type.as_str())
        // inline + no-store: render in the viewer, never cache, discourage
        // casual download
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", safe_title),
        )
        .header(header::CACHE_CONTROL, "no-store, private")
        .header(header::PRAGMA, "no-cache")
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}
