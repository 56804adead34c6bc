//! Cloudinary storage implementation.
//!
//! Uploads go through the provider's HTTP upload API, tagged with a folder
//! (`category/projectId`) and a public id. Because only the delivery URL is
//! persisted, deletion and signing re-derive `{folder, public_id,
//! resource_type}` from the URL (see [`derive_address`]).
//!
//! Documents upload as `raw` resources. The provider serves `raw` assets
//! without access control unless the delivery type is `authenticated`, so
//! signed URLs for raw resources MUST switch delivery type; images and
//! videos keep the public `upload` type. Getting this wrong makes
//! confidential documents publicly fetchable.

use crate::filename::{extension, unique_filename};
use crate::traits::{DocumentStorage, StorageError, StorageResult};
use async_trait::async_trait;
use brix_core::config::CloudCredentials;
use brix_core::models::StoredFile;
use brix_core::policy::ImageOptions;
use brix_core::StorageStrategy;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

const UPLOAD_BASE: &str = "https://api.cloudinary.com/v1_1";
const DELIVERY_BASE: &str = "https://res.cloudinary.com";

/// Provider-side resource class, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Image,
    Video,
    Raw,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Video => "video",
            ResourceType::Raw => "raw",
        }
    }

    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "avif" | "svg" => ResourceType::Image,
            "mp4" | "webm" | "mov" | "avi" | "mkv" | "m4v" => ResourceType::Video,
            _ => ResourceType::Raw,
        }
    }
}

/// Native address of a cloud object, recovered from its delivery URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudAddress {
    pub folder: String,
    /// Full public id including the folder prefix.
    pub public_id: String,
    pub resource_type: ResourceType,
    pub extension: String,
}

/// Recover the native address from a delivery URL.
///
/// The URL path is split into segments; everything between the literal
/// `upload` marker and the filename is the folder (a `v<digits>` version
/// segment inserted by the provider is skipped), the last segment minus its
/// extension is the public id stem, and the extension classifies the
/// resource type.
pub fn derive_address(url: &str) -> StorageResult<CloudAddress> {
    let without_query = url.split('?').next().unwrap_or(url);
    let path = without_query
        .find("://")
        .map(|i| &without_query[i + 3..])
        .and_then(|rest| rest.find('/').map(|i| &rest[i..]))
        .ok_or_else(|| StorageError::InvalidUrl(format!("Not an absolute URL: {}", url)))?;

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let marker = segments
        .iter()
        .position(|s| *s == "upload")
        .ok_or_else(|| StorageError::InvalidUrl(format!("No upload marker in URL: {}", url)))?;

    if marker + 1 >= segments.len() {
        return Err(StorageError::InvalidUrl(format!(
            "No filename after upload marker: {}",
            url
        )));
    }

    let filename = segments[segments.len() - 1];
    let mut folder_segments = &segments[marker + 1..segments.len() - 1];
    if let Some(first) = folder_segments.first() {
        if is_version_segment(first) {
            folder_segments = &folder_segments[1..];
        }
    }
    let folder = folder_segments.join("/");

    let (stem, ext) = filename.rsplit_once('.').ok_or_else(|| {
        StorageError::InvalidUrl(format!("Filename has no extension: {}", filename))
    })?;

    let public_id = if folder.is_empty() {
        stem.to_string()
    } else {
        format!("{}/{}", folder, stem)
    };

    Ok(CloudAddress {
        folder,
        public_id,
        resource_type: ResourceType::from_extension(ext),
        extension: ext.to_lowercase(),
    })
}

fn is_version_segment(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}

/// Cloud storage backed by the Cloudinary upload/delivery API.
#[derive(Clone)]
pub struct CloudinaryStorage {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryStorage {
    pub fn new(credentials: CloudCredentials) -> Self {
        CloudinaryStorage {
            client: reqwest::Client::new(),
            cloud_name: credentials.cloud_name,
            api_key: credentials.api_key,
            api_secret: credentials.api_secret,
        }
    }

    /// Request signature for the upload/destroy API: SHA-256 over the
    /// alphabetically sorted parameters with the API secret appended.
    fn api_signature(&self, params: &[(&str, &str)]) -> String {
        let mut sorted: Vec<(&str, &str)> = params.to_vec();
        sorted.sort_by_key(|(k, _)| *k);
        let to_sign: String = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Token bound to a delivery path and absolute expiry timestamp.
    fn delivery_token(&self, path: &str, expires_at: i64) -> StorageResult<String> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.api_secret.as_bytes())
            .map_err(|e| StorageError::SignFailed(e.to_string()))?;
        mac.update(path.as_bytes());
        mac.update(expires_at.to_string().as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn delivery_url(&self, resource_type: ResourceType, folder: &str, filename: &str) -> String {
        format!(
            "{}/{}/{}/upload/{}/{}",
            DELIVERY_BASE,
            self.cloud_name,
            resource_type.as_str(),
            folder,
            filename
        )
    }

    /// Upload a buffer under `{folder}/{stem}.{ext}` and return the
    /// canonical delivery URL.
    async fn upload(
        &self,
        data: Vec<u8>,
        content_type: &str,
        folder: &str,
        filename: &str,
    ) -> StorageResult<String> {
        let (stem, ext) = filename
            .rsplit_once('.')
            .ok_or_else(|| StorageError::UploadFailed(format!("Missing extension: {}", filename)))?;
        let resource_type = ResourceType::from_extension(ext);

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.api_signature(&[
            ("folder", folder),
            ("public_id", stem),
            ("timestamp", &timestamp),
        ]);

        let size = data.len();
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| StorageError::UploadFailed(format!("Invalid content type: {}", e)))?;
        let form = reqwest::multipart::Form::new()
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("public_id", stem.to_string())
            .text("signature", signature)
            .part("file", part);

        let endpoint = format!(
            "{}/{}/{}/upload",
            UPLOAD_BASE,
            self.cloud_name,
            resource_type.as_str()
        );

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(&endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                folder = %folder,
                filename = %filename,
                "Cloud upload failed"
            );
            return Err(StorageError::UploadFailed(format!(
                "Provider returned {}: {}",
                status, body
            )));
        }

        tracing::info!(
            folder = %folder,
            key = %filename,
            resource_type = resource_type.as_str(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Cloud upload successful"
        );

        Ok(self.delivery_url(resource_type, folder, filename))
    }
}

#[async_trait]
impl DocumentStorage for CloudinaryStorage {
    async fn store_file(&self, file: &StoredFile, target_path: &str) -> StorageResult<String> {
        let ext = extension(&file.original_name).unwrap_or_else(|| "bin".to_string());
        let filename = unique_filename(&file.original_name, Some(&ext));
        self.upload(
            file.data.clone(),
            &file.content_type,
            target_path.trim_matches('/'),
            &filename,
        )
        .await
    }

    async fn store_image(
        &self,
        file: &StoredFile,
        target_path: &str,
        options: &ImageOptions,
    ) -> StorageResult<String> {
        let optimized = brix_processing::optimize(&file.data, options)?;
        let filename = unique_filename(&file.original_name, Some(optimized.extension()));
        let content_type = optimized.content_type();
        self.upload(
            optimized.data,
            content_type,
            target_path.trim_matches('/'),
            &filename,
        )
        .await
    }

    async fn delete_file(&self, url: &str) -> bool {
        let address = match derive_address(url) {
            Ok(address) => address,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Cloud delete: cannot derive address");
                return false;
            }
        };

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.api_signature(&[
            ("public_id", &address.public_id),
            ("timestamp", &timestamp),
        ]);

        let endpoint = format!(
            "{}/{}/{}/destroy",
            UPLOAD_BASE,
            self.cloud_name,
            address.resource_type.as_str()
        );

        let response = self
            .client
            .post(&endpoint)
            .form(&[
                ("public_id", address.public_id.as_str()),
                ("timestamp", timestamp.as_str()),
                ("api_key", self.api_key.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(public_id = %address.public_id, error = %e, "Cloud delete request failed");
                return false;
            }
        };

        let result: serde_json::Value = match response.json().await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(public_id = %address.public_id, error = %e, "Cloud delete: unreadable response");
                return false;
            }
        };

        match result.get("result").and_then(|v| v.as_str()) {
            Some("ok") => {
                tracing::info!(public_id = %address.public_id, "Cloud delete successful");
                true
            }
            Some("not found") => {
                tracing::debug!(public_id = %address.public_id, "Cloud delete: object already absent");
                false
            }
            other => {
                tracing::warn!(public_id = %address.public_id, result = ?other, "Cloud delete failed");
                false
            }
        }
    }

    async fn get_signed_url(&self, url: &str, expires_in_secs: u64) -> StorageResult<String> {
        let address = derive_address(url)?;

        // Raw assets are served without access control under the public
        // delivery type; confidential documents must go out authenticated.
        let delivery_type = match address.resource_type {
            ResourceType::Raw => "authenticated",
            _ => "upload",
        };

        let expires_at = chrono::Utc::now().timestamp() + expires_in_secs as i64;
        let path = format!(
            "/{}/{}/{}/{}.{}",
            self.cloud_name,
            address.resource_type.as_str(),
            delivery_type,
            address.public_id,
            address.extension
        );
        let token = self.delivery_token(&path, expires_at)?;

        Ok(format!(
            "{}{}?exp={}&token={}",
            DELIVERY_BASE, path, expires_at, token
        ))
    }

    fn get_public_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            DELIVERY_BASE,
            self.cloud_name,
            path.trim_start_matches('/')
        )
    }

    fn strategy(&self) -> StorageStrategy {
        StorageStrategy::Cloud
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_storage() -> CloudinaryStorage {
        CloudinaryStorage::new(CloudCredentials {
            cloud_name: "brix-test".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
        })
    }

    #[test]
    fn test_derive_address_raw_document() {
        let url = "https://res.cloudinary.com/brix-test/raw/upload/documents/p1/deed-abc123.pdf";
        let address = derive_address(url).unwrap();

        assert_eq!(address.folder, "documents/p1");
        assert_eq!(address.public_id, "documents/p1/deed-abc123");
        assert_eq!(address.resource_type, ResourceType::Raw);
        assert_eq!(address.extension, "pdf");
    }

    #[test]
    fn test_derive_address_roundtrips_extensions() {
        let cases = [
            ("deed-1.pdf", ResourceType::Raw),
            ("facade-1.jpg", ResourceType::Image),
            ("plan-1.webp", ResourceType::Image),
            ("tour-1.mp4", ResourceType::Video),
        ];
        for (filename, expected) in cases {
            let url = format!(
                "https://res.cloudinary.com/brix-test/{}/upload/documents/p1/{}",
                expected.as_str(),
                filename
            );
            let address = derive_address(&url).unwrap();
            assert_eq!(address.resource_type, expected, "{}", filename);
            assert_eq!(address.folder, "documents/p1");
        }
    }

    #[test]
    fn test_derive_address_skips_version_segment() {
        let url =
            "https://res.cloudinary.com/brix-test/image/upload/v1712345678/images/p1/facade-a.jpg";
        let address = derive_address(url).unwrap();

        assert_eq!(address.folder, "images/p1");
        assert_eq!(address.public_id, "images/p1/facade-a");
    }

    #[test]
    fn test_derive_address_rejects_malformed() {
        assert!(derive_address("not a url").is_err());
        assert!(derive_address("https://res.cloudinary.com/brix-test/image/fetch/x.jpg").is_err());
        assert!(derive_address(
            "https://res.cloudinary.com/brix-test/raw/upload/documents/noextension"
        )
        .is_err());
    }

    #[test]
    fn test_derive_address_ignores_query() {
        let url = "https://res.cloudinary.com/brix-test/raw/upload/documents/p1/deed-a.pdf?exp=99";
        assert_eq!(derive_address(url).unwrap().extension, "pdf");
    }

    #[tokio::test]
    async fn test_signed_url_raw_is_authenticated() {
        let storage = test_storage();
        let url = "https://res.cloudinary.com/brix-test/raw/upload/documents/p1/deed-a.pdf";

        let before = chrono::Utc::now().timestamp();
        let signed = storage.get_signed_url(url, 3600).await.unwrap();

        assert!(signed.contains("/raw/authenticated/"));
        assert!(!signed.contains("/raw/upload/"));

        let exp: i64 = signed
            .split("exp=")
            .nth(1)
            .unwrap()
            .split('&')
            .next()
            .unwrap()
            .parse()
            .unwrap();
        assert!(exp >= before + 3600);
        assert!(exp <= chrono::Utc::now().timestamp() + 3600);
    }

    #[tokio::test]
    async fn test_signed_url_image_and_video_stay_public() {
        let storage = test_storage();

        let image = "https://res.cloudinary.com/brix-test/image/upload/images/p1/facade-a.jpg";
        let signed = storage.get_signed_url(image, 600).await.unwrap();
        assert!(signed.contains("/image/upload/"));
        assert!(!signed.contains("authenticated"));

        let video = "https://res.cloudinary.com/brix-test/video/upload/videos/p1/tour-a.mp4";
        let signed = storage.get_signed_url(video, 600).await.unwrap();
        assert!(signed.contains("/video/upload/"));
    }

    #[tokio::test]
    async fn test_delete_malformed_url_returns_false() {
        let storage = test_storage();
        // derivation fails before any network call
        assert!(!storage.delete_file("garbage").await);
    }

    #[test]
    fn test_api_signature_is_order_independent() {
        let storage = test_storage();
        let a = storage.api_signature(&[("folder", "f"), ("timestamp", "1")]);
        let b = storage.api_signature(&[("timestamp", "1"), ("folder", "f")]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_get_public_url() {
        let storage = test_storage();
        assert_eq!(
            storage.get_public_url("/images/p1/facade.jpg"),
            "https://res.cloudinary.com/brix-test/images/p1/facade.jpg"
        );
        assert_eq!(storage.strategy(), StorageStrategy::Cloud);
    }
}
