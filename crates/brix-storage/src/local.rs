use crate::filename::unique_filename;
use crate::traits::{DocumentStorage, StorageError, StorageResult};
use async_trait::async_trait;
use brix_core::models::StoredFile;
use brix_core::policy::ImageOptions;
use brix_core::StorageStrategy;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// URL path marker separating the origin from the storage-relative path.
const URL_PREFIX: &str = "/uploads/";

/// Local filesystem storage implementation.
///
/// Delivery URLs are `{base_url}/uploads/{target_path}/{filename}` and files
/// live under `base_path` with the same relative layout. `get_signed_url` is
/// a passthrough: there is no access control on a static file root, so this
/// variant is a reduced-security mode for local and dev use only.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance rooted at `base_path`.
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Reject relative paths that could escape the storage root.
    fn validate_relative(rel: &str) -> StorageResult<()> {
        if rel.contains("..") || rel.starts_with('/') || rel.is_empty() {
            return Err(StorageError::InvalidUrl(
                "Storage path contains invalid components".to_string(),
            ));
        }
        Ok(())
    }

    /// Re-derive the on-disk path from a delivery URL: strip the origin and
    /// the `uploads/` prefix, then join the remainder onto the storage root.
    fn url_to_path(&self, url: &str) -> StorageResult<PathBuf> {
        let idx = url
            .find(URL_PREFIX)
            .ok_or_else(|| StorageError::InvalidUrl(format!("Not a local storage URL: {}", url)))?;

        let remainder = &url[idx + URL_PREFIX.len()..];
        let remainder = remainder.split('?').next().unwrap_or(remainder);
        let decoded = urlencoding::decode(remainder)
            .map_err(|e| StorageError::InvalidUrl(format!("Malformed URL encoding: {}", e)))?;

        Self::validate_relative(&decoded)?;
        Ok(self.base_path.join(decoded.as_ref()))
    }

    fn url_for(&self, rel: &str) -> String {
        format!("{}{}{}", self.base_url, URL_PREFIX, rel)
    }

    /// Write bytes under `{target_path}/{filename}` via a temp file and
    /// rename, so a failed write never leaves a visible object under its
    /// final name.
    async fn write_bytes(
        &self,
        target_path: &str,
        filename: &str,
        data: &[u8],
    ) -> StorageResult<String> {
        let rel = format!("{}/{}", target_path.trim_matches('/'), filename);
        Self::validate_relative(&rel)?;

        let path = self.base_path.join(&rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_file_name(format!(".{}.part", filename));
        let start = std::time::Instant::now();

        let result: StorageResult<()> = async {
            let mut file = fs::File::create(&tmp).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create file {}: {}",
                    tmp.display(),
                    e
                ))
            })?;
            file.write_all(data).await.map_err(|e| {
                StorageError::UploadFailed(format!("Failed to write file {}: {}", tmp.display(), e))
            })?;
            file.sync_all().await.map_err(|e| {
                StorageError::UploadFailed(format!("Failed to sync file {}: {}", tmp.display(), e))
            })?;
            fs::rename(&tmp, &path).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to finalize file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            Ok(())
        }
        .await;

        if result.is_err() {
            let _ = fs::remove_file(&tmp).await;
        }
        result?;

        tracing::info!(
            path = %path.display(),
            key = %rel,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(self.url_for(&rel))
    }
}

#[async_trait]
impl DocumentStorage for LocalStorage {
    async fn store_file(&self, file: &StoredFile, target_path: &str) -> StorageResult<String> {
        let filename = unique_filename(&file.original_name, None);
        self.write_bytes(target_path, &filename, &file.data).await
    }

    async fn store_image(
        &self,
        file: &StoredFile,
        target_path: &str,
        options: &ImageOptions,
    ) -> StorageResult<String> {
        let optimized = brix_processing::optimize(&file.data, options)?;
        let filename = unique_filename(&file.original_name, Some(optimized.extension()));
        self.write_bytes(target_path, &filename, &optimized.data)
            .await
    }

    async fn delete_file(&self, url: &str) -> bool {
        let path = match self.url_to_path(url) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Local storage delete: cannot derive path");
                return false;
            }
        };

        if !fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(path = %path.display(), "Local storage delete: file already absent");
            return false;
        }

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Local storage delete successful");
                true
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Local storage delete failed");
                false
            }
        }
    }

    /// Passthrough: local files have no access control to enforce, so the
    /// "signed" URL is the original URL.
    async fn get_signed_url(&self, url: &str, _expires_in_secs: u64) -> StorageResult<String> {
        Ok(url.to_string())
    }

    fn get_public_url(&self, path: &str) -> String {
        self.url_for(path.trim_start_matches('/'))
    }

    fn strategy(&self) -> StorageStrategy {
        StorageStrategy::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use tempfile::tempdir;

    const BASE_URL: &str = "http://localhost:3000";

    fn stored(name: &str, content_type: &str, data: Vec<u8>) -> StoredFile {
        StoredFile {
            original_name: name.to_string(),
            content_type: content_type.to_string(),
            data,
        }
    }

    fn test_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 120, 200, 255]));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[tokio::test]
    async fn test_store_and_delete_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap();

        for name in ["deed.pdf", "facade.jpg", "plan.webp", "tour.mp4"] {
            let file = stored(name, "application/octet-stream", b"content".to_vec());
            let url = storage
                .store_file(&file, "documents/project-1")
                .await
                .unwrap();

            assert!(url.starts_with("http://localhost:3000/uploads/documents/project-1/"));
            let path = storage.url_to_path(&url).unwrap();
            assert!(path.exists());

            assert!(storage.delete_file(&url).await);
            assert!(!path.exists());
            // second delete: already absent
            assert!(!storage.delete_file(&url).await);
        }
    }

    #[tokio::test]
    async fn test_delete_malformed_url_returns_false() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap();

        assert!(!storage.delete_file("not a url").await);
        assert!(!storage.delete_file("http://elsewhere/files/x.pdf").await);
        assert!(
            !storage
                .delete_file("http://localhost:3000/uploads/../../etc/passwd")
                .await
        );
    }

    #[tokio::test]
    async fn test_signed_url_is_passthrough() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap();

        let url = "http://localhost:3000/uploads/documents/p/deed-abc.pdf";
        assert_eq!(storage.get_signed_url(url, 3600).await.unwrap(), url);
    }

    #[tokio::test]
    async fn test_store_image_reencodes_to_webp() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap();

        let file = stored("photo.png", "image/png", test_png(1200, 900));
        let options = ImageOptions {
            width: Some(300),
            height: Some(300),
            ..ImageOptions::default()
        };
        let url = storage
            .store_image(&file, "images/project-1", &options)
            .await
            .unwrap();

        assert!(url.ends_with(".webp"));
        let path = storage.url_to_path(&url).unwrap();
        let bytes = std::fs::read(path).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
    }

    #[tokio::test]
    async fn test_get_public_url() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), format!("{}/", BASE_URL))
            .await
            .unwrap();

        assert_eq!(
            storage.get_public_url("documents/p/deed.pdf"),
            "http://localhost:3000/uploads/documents/p/deed.pdf"
        );
        assert_eq!(storage.strategy(), StorageStrategy::Local);
    }

    #[tokio::test]
    async fn test_no_partial_file_visible_after_store() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap();

        let file = stored("report.pdf", "application/pdf", vec![7u8; 1024]);
        let url = storage.store_file(&file, "documents/p").await.unwrap();
        let path = storage.url_to_path(&url).unwrap();

        // only the finalized file remains; no .part leftovers
        let names: Vec<String> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(!names[0].ends_with(".part"));
    }
}
