//! Application state shared across handlers.

use crate::auth::secure_link::SecureLinkService;
use crate::auth::AuthTokenVerifier;
use crate::services::document::DocumentService;
use brix_core::Config;
use brix_storage::DocumentStorage;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    /// The process-wide storage backend chosen at startup.
    pub storage: Arc<dyn DocumentStorage>,
    pub documents: DocumentService,
    pub secure_links: SecureLinkService,
    pub auth: AuthTokenVerifier,
    /// Client used by the secure delivery gate to proxy document content.
    pub http: reqwest::Client,
}
