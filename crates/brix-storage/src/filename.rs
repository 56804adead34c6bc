//! Unique storage filename generation shared by both backends.
//!
//! Names are `{slugified-stem}-{random suffix}.{ext}` so repeated uploads of
//! the same file never collide.

use std::path::Path;
use uuid::Uuid;

/// Lowercase, ASCII-alphanumeric slug; runs of other characters collapse to
/// a single dash. Empty input slugs to "file".
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_dash = true;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "file".to_string()
    } else {
        slug
    }
}

/// Lowercased extension of a filename, if any.
pub fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Build a collision-free storage filename from the original name.
///
/// `override_extension` replaces the original extension (used when the image
/// pipeline changes the output format).
pub fn unique_filename(original_name: &str, override_extension: Option<&str>) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(original_name);
    let slug = slugify(stem);

    let suffix = Uuid::new_v4().simple().to_string();
    let suffix = &suffix[..12];

    match override_extension.map(str::to_string).or_else(|| extension(original_name)) {
        Some(ext) => format!("{}-{}.{}", slug, suffix, ext),
        None => format!("{}-{}", slug, suffix),
    }
}
