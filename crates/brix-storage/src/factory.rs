use crate::{CloudinaryStorage, DocumentStorage, LocalStorage, StorageResult};
use brix_core::{Config, StorageStrategy};
use std::sync::Arc;

/// Create the process-wide storage backend from configuration.
///
/// Called once at startup; the returned instance is shared across all
/// requests. Selecting `cloud` without a full credentials triple logs an
/// error and falls back to local storage instead of failing startup.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn DocumentStorage>> {
    match config.storage_strategy {
        StorageStrategy::Cloud => match config.cloud_credentials.clone() {
            Some(credentials) => {
                tracing::info!(cloud_name = %credentials.cloud_name, "Using cloud storage backend");
                Ok(Arc::new(CloudinaryStorage::new(credentials)))
            }
            None => {
                tracing::error!(
                    "Cloud storage selected but credentials are incomplete; falling back to local storage"
                );
                local_storage(config).await
            }
        },
        StorageStrategy::Local => local_storage(config).await,
    }
}

async fn local_storage(config: &Config) -> StorageResult<Arc<dyn DocumentStorage>> {
    tracing::info!(path = %config.local_storage_path, "Using local storage backend");
    let storage = LocalStorage::new(
        config.local_storage_path.clone(),
        config.base_url.clone(),
    )
    .await?;
    Ok(Arc::new(storage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use brix_core::config::CloudCredentials;

    fn test_config(dir: &std::path::Path) -> Config {
        Config {
            server_port: 3000,
            base_url: "http://localhost:3000".to_string(),
            environment: "test".to_string(),
            cors_origins: vec![],
            database_url: "postgres://localhost/brix_test".to_string(),
            db_max_connections: 5,
            storage_strategy: StorageStrategy::Local,
            local_storage_path: dir.to_string_lossy().into_owned(),
            cloud_credentials: None,
            secure_link_secret: "test-secret".to_string(),
            secure_link_ttl_secs: 3600,
            jwt_secret: "test-jwt".to_string(),
        }
    }

    #[tokio::test]
    async fn test_local_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let storage = create_storage(&test_config(dir.path())).await.unwrap();
        assert_eq!(storage.strategy(), StorageStrategy::Local);
    }

    #[tokio::test]
    async fn test_cloud_with_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.storage_strategy = StorageStrategy::Cloud;
        config.cloud_credentials = Some(CloudCredentials {
            cloud_name: "brix".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
        });

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.strategy(), StorageStrategy::Cloud);
    }

    #[tokio::test]
    async fn test_cloud_without_credentials_falls_back_to_local() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.storage_strategy = StorageStrategy::Cloud;
        config.cloud_credentials = None;

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.strategy(), StorageStrategy::Local);
    }
}
