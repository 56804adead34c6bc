//! Document access policy
//!
//! Static configuration for file-type classes (MIME allowlists, size
//! ceilings, storage directories) and image optimization presets. Fixed at
//! compile time; not runtime-overridable.

use crate::models::StoredFile;

/// Classification of an upload, driving which storage pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Document,
    Image,
    Video,
    /// Fallback class for callers that accept anything.
    Any,
}

/// Allowed types, size ceiling, and storage directory for one file class.
#[derive(Debug)]
pub struct FileTypePolicy {
    pub mime_types: &'static [&'static str],
    pub extensions: &'static [&'static str],
    pub max_size_bytes: usize,
    pub directory: &'static str,
}

const MB: usize = 1024 * 1024;

static DOCUMENT_POLICY: FileTypePolicy = FileTypePolicy {
    mime_types: &[
        "application/pdf",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "application/vnd.ms-excel",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "application/vnd.ms-powerpoint",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "text/plain",
        "text/csv",
    ],
    extensions: &[
        "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "csv",
    ],
    max_size_bytes: 10 * MB,
    directory: "documents",
};

static IMAGE_POLICY: FileTypePolicy = FileTypePolicy {
    mime_types: &[
        "image/jpeg",
        "image/png",
        "image/gif",
        "image/webp",
        "image/avif",
        "image/svg+xml",
    ],
    extensions: &["jpg", "jpeg", "png", "gif", "webp", "avif", "svg"],
    max_size_bytes: 5 * MB,
    directory: "images",
};

static VIDEO_POLICY: FileTypePolicy = FileTypePolicy {
    mime_types: &[
        "video/mp4",
        "video/webm",
        "video/quicktime",
        "video/x-msvideo",
        "video/x-matroska",
    ],
    extensions: &["mp4", "webm", "mov", "avi", "mkv"],
    max_size_bytes: 100 * MB,
    directory: "videos",
};

static ANY_POLICY: FileTypePolicy = FileTypePolicy {
    mime_types: &[],
    extensions: &[],
    max_size_bytes: 20 * MB,
    directory: "files",
};

/// Policy table lookup for a file class.
pub fn policy_for(class: FileClass) -> &'static FileTypePolicy {
    match class {
        FileClass::Document => &DOCUMENT_POLICY,
        FileClass::Image => &IMAGE_POLICY,
        FileClass::Video => &VIDEO_POLICY,
        FileClass::Any => &ANY_POLICY,
    }
}

/// Classify a MIME type into exactly one pipeline class.
///
/// Prefix rules: `image/*` is an image, `video/*` is a video, everything
/// else is treated as a document.
pub fn classify(mime_type: &str) -> FileClass {
    let normalized = mime_type.to_lowercase();
    if normalized.starts_with("image/") {
        FileClass::Image
    } else if normalized.starts_with("video/") {
        FileClass::Video
    } else {
        FileClass::Document
    }
}

/// Check a file against a class policy.
///
/// With no policy every file is allowed; with a policy the file's content
/// type must be in the allowlist. The `Any` class has an empty allowlist and
/// accepts everything.
pub fn is_file_type_allowed(file: &StoredFile, policy: Option<&FileTypePolicy>) -> bool {
    match policy {
        None => true,
        Some(p) if p.mime_types.is_empty() => true,
        Some(p) => {
            let normalized = file.content_type.to_lowercase();
            p.mime_types.iter().any(|m| *m == normalized)
        }
    }
}

/// Output format of the image optimization pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageOutputFormat {
    WebP,
    Jpeg,
    Png,
}

impl ImageOutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "webp" => Some(ImageOutputFormat::WebP),
            "jpeg" | "jpg" => Some(ImageOutputFormat::Jpeg),
            "png" => Some(ImageOutputFormat::Png),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageOutputFormat::WebP => "webp",
            ImageOutputFormat::Jpeg => "jpg",
            ImageOutputFormat::Png => "png",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageOutputFormat::WebP => "image/webp",
            ImageOutputFormat::Jpeg => "image/jpeg",
            ImageOutputFormat::Png => "image/png",
        }
    }
}

/// Options for the image resize/re-encode pipeline.
///
/// Bounds are fit-within: aspect ratio is preserved and images are never
/// upscaled. `None` for both bounds means re-encode only.
#[derive(Debug, Clone, Copy)]
pub struct ImageOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: u8,
    pub format: ImageOutputFormat,
}

impl Default for ImageOptions {
    fn default() -> Self {
        ImageOptions {
            width: None,
            height: None,
            quality: 80,
            format: ImageOutputFormat::WebP,
        }
    }
}

/// Named bundle of resize/quality/format applied to images at upload time.
#[derive(Debug, Clone, Copy)]
pub struct OptimizePreset {
    pub name: &'static str,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: u8,
    pub format: ImageOutputFormat,
}

impl From<&OptimizePreset> for ImageOptions {
    fn from(preset: &OptimizePreset) -> Self {
        ImageOptions {
            width: preset.width,
            height: preset.height,
            quality: preset.quality,
            format: preset.format,
        }
    }
}

static THUMBNAIL: OptimizePreset = OptimizePreset {
    name: "thumbnail",
    width: Some(300),
    height: Some(300),
    quality: 80,
    format: ImageOutputFormat::WebP,
};

static MEDIUM: OptimizePreset = OptimizePreset {
    name: "medium",
    width: Some(800),
    height: Some(600),
    quality: 80,
    format: ImageOutputFormat::WebP,
};

static LARGE: OptimizePreset = OptimizePreset {
    name: "large",
    width: Some(1600),
    height: Some(1200),
    quality: 85,
    format: ImageOutputFormat::WebP,
};

static ORIGINAL: OptimizePreset = OptimizePreset {
    name: "original",
    width: None,
    height: None,
    quality: 90,
    format: ImageOutputFormat::WebP,
};

static PRESETS: &[&OptimizePreset] = &[&THUMBNAIL, &MEDIUM, &LARGE, &ORIGINAL];

/// Case-insensitive preset lookup.
pub fn preset(name: &str) -> Option<&'static OptimizePreset> {
    let normalized = name.to_lowercase();
    PRESETS.iter().find(|p| p.name == normalized).copied()
}

/// Resolve the `optimize` upload field to a preset.
///
/// An unknown name resolves to `medium`; an absent field resolves to
/// `original` (re-encode without resizing).
pub fn select_preset(optimize: Option<&str>) -> &'static OptimizePreset {
    match optimize {
        Some(name) => preset(name).unwrap_or(&MEDIUM),
        None => &ORIGINAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(content_type: &str) -> StoredFile {
        StoredFile {
            original_name: "file.bin".to_string(),
            content_type: content_type.to_string(),
            data: vec![0u8; 16],
        }
    }

    #[test]
    fn test_classify_prefix_rules() {
        assert_eq!(classify("image/jpeg"), FileClass::Image);
        assert_eq!(classify("image/svg+xml"), FileClass::Image);
        assert_eq!(classify("video/mp4"), FileClass::Video);
        assert_eq!(classify("application/pdf"), FileClass::Document);
        assert_eq!(classify("text/plain"), FileClass::Document);
        assert_eq!(classify("IMAGE/PNG"), FileClass::Image);
    }

    #[test]
    fn test_is_file_type_allowed_no_policy() {
        assert!(is_file_type_allowed(&stored("application/x-whatever"), None));
    }

    #[test]
    fn test_is_file_type_allowed_membership() {
        let images = policy_for(FileClass::Image);
        assert!(is_file_type_allowed(&stored("image/jpeg"), Some(images)));
        assert!(is_file_type_allowed(&stored("IMAGE/JPEG"), Some(images)));
        assert!(!is_file_type_allowed(
            &stored("application/pdf"),
            Some(images)
        ));
    }

    #[test]
    fn test_any_policy_accepts_everything() {
        let any = policy_for(FileClass::Any);
        assert!(is_file_type_allowed(&stored("application/x-unknown"), Some(any)));
        assert_eq!(any.max_size_bytes, 20 * MB);
    }

    #[test]
    fn test_size_ceilings() {
        assert_eq!(policy_for(FileClass::Image).max_size_bytes, 5 * MB);
        assert_eq!(policy_for(FileClass::Document).max_size_bytes, 10 * MB);
        assert_eq!(policy_for(FileClass::Video).max_size_bytes, 100 * MB);
    }

    #[test]
    fn test_preset_lookup_case_insensitive() {
        assert_eq!(preset("Thumbnail").unwrap().width, Some(300));
        assert_eq!(preset("MEDIUM").unwrap().height, Some(600));
        assert!(preset("giant").is_none());
    }

    #[test]
    fn test_select_preset_resolution() {
        assert_eq!(select_preset(Some("thumbnail")).name, "thumbnail");
        // unknown key falls back to medium, absent key to original
        assert_eq!(select_preset(Some("nonsense")).name, "medium");
        assert_eq!(select_preset(None).name, "original");
    }

    #[test]
    fn test_preset_to_options() {
        let options = ImageOptions::from(preset("thumbnail").unwrap());
        assert_eq!(options.width, Some(300));
        assert_eq!(options.quality, 80);
        assert_eq!(options.format, ImageOutputFormat::WebP);
    }
}
