//! Image optimization pipeline
//!
//! Decodes an uploaded image, fits it within the requested bounds without
//! upscaling, and re-encodes it in the requested output format.

use brix_core::policy::{ImageOptions, ImageOutputFormat};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Result of the optimization pipeline.
#[derive(Debug, Clone)]
pub struct OptimizedImage {
    pub data: Vec<u8>,
    pub format: ImageOutputFormat,
    pub width: u32,
    pub height: u32,
}

impl OptimizedImage {
    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    pub fn content_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Resize and re-encode an image buffer.
///
/// Bounds are fit-within: the aspect ratio is preserved and the image is
/// only resized when it exceeds a bound. A source smaller than the bounds
/// passes through at its original dimensions (never upscaled).
pub fn optimize(data: &[u8], options: &ImageOptions) -> Result<OptimizedImage, ProcessingError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ProcessingError::Decode(e.to_string()))?;
    let img = reader
        .decode()
        .map_err(|e| ProcessingError::Decode(e.to_string()))?;

    let (src_width, src_height) = img.dimensions();

    let bound_width = options.width.unwrap_or(u32::MAX);
    let bound_height = options.height.unwrap_or(u32::MAX);

    let img = if src_width > bound_width || src_height > bound_height {
        img.resize(bound_width, bound_height, FilterType::Lanczos3)
    } else {
        img
    };

    let (width, height) = img.dimensions();
    let data = encode(&img, options)?;

    tracing::debug!(
        src_width,
        src_height,
        width,
        height,
        format = ?options.format,
        quality = options.quality,
        size_bytes = data.len(),
        "Image optimization complete"
    );

    Ok(OptimizedImage {
        data,
        format: options.format,
        width,
        height,
    })
}

fn encode(img: &DynamicImage, options: &ImageOptions) -> Result<Vec<u8>, ProcessingError> {
    match options.format {
        ImageOutputFormat::WebP => {
            // The webp encoder only accepts RGB8/RGBA8 buffers.
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            let encoder = webp::Encoder::from_image(&rgba)
                .map_err(|e| ProcessingError::Encode(e.to_string()))?;
            Ok(encoder.encode(f32::from(options.quality)).to_vec())
        }
        ImageOutputFormat::Jpeg => {
            let mut out = Cursor::new(Vec::new());
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, options.quality);
            // JPEG has no alpha channel.
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(|e| ProcessingError::Encode(e.to_string()))?;
            Ok(out.into_inner())
        }
        ImageOutputFormat::Png => {
            let mut out = Cursor::new(Vec::new());
            img.write_to(&mut out, ImageFormat::Png)
                .map_err(|e| ProcessingError::Encode(e.to_string()))?;
            Ok(out.into_inner())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn create_test_image(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([180, 40, 20, 255]));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    fn decode_dimensions(data: &[u8]) -> (u32, u32) {
        let img = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap();
        img.dimensions()
    }

    fn options(width: Option<u32>, height: Option<u32>) -> ImageOptions {
        ImageOptions {
            width,
            height,
            ..ImageOptions::default()
        }
    }

    #[test]
    fn test_resize_fits_within_bounds() {
        let data = create_test_image(1600, 1200);
        let result = optimize(&data, &options(Some(800), Some(600))).unwrap();

        assert!(result.width <= 800);
        assert!(result.height <= 600);
        // 4:3 source into a 4:3 bound fills it exactly
        assert_eq!((result.width, result.height), (800, 600));
    }

    #[test]
    fn test_never_upscales() {
        let data = create_test_image(200, 150);
        let result = optimize(&data, &options(Some(800), Some(600))).unwrap();

        assert_eq!((result.width, result.height), (200, 150));
    }

    #[test]
    fn test_aspect_ratio_preserved() {
        // 2:1 source must stay 2:1 inside a square bound
        let data = create_test_image(1000, 500);
        let result = optimize(&data, &options(Some(300), Some(300))).unwrap();

        assert_eq!((result.width, result.height), (300, 150));
    }

    #[test]
    fn test_width_only_bound() {
        let data = create_test_image(1000, 500);
        let result = optimize(&data, &options(Some(500), None)).unwrap();

        assert_eq!((result.width, result.height), (500, 250));
    }

    #[test]
    fn test_default_format_is_webp() {
        let data = create_test_image(100, 100);
        let result = optimize(&data, &ImageOptions::default()).unwrap();

        assert_eq!(result.format, ImageOutputFormat::WebP);
        assert_eq!(result.extension(), "webp");
        assert_eq!(result.content_type(), "image/webp");
        // RIFF container magic
        assert_eq!(&result.data[..4], b"RIFF");
    }

    #[test]
    fn test_jpeg_output() {
        let data = create_test_image(100, 100);
        let opts = ImageOptions {
            format: ImageOutputFormat::Jpeg,
            ..ImageOptions::default()
        };
        let result = optimize(&data, &opts).unwrap();

        assert_eq!(result.extension(), "jpg");
        assert_eq!(&result.data[..2], &[0xFF, 0xD8]);
        assert_eq!(decode_dimensions(&result.data), (100, 100));
    }

    #[test]
    fn test_png_output() {
        let data = create_test_image(64, 32);
        let opts = ImageOptions {
            format: ImageOutputFormat::Png,
            ..ImageOptions::default()
        };
        let result = optimize(&data, &opts).unwrap();

        assert_eq!(&result.data[1..4], b"PNG");
        assert_eq!(decode_dimensions(&result.data), (64, 32));
    }

    #[test]
    fn test_invalid_input_fails_decode() {
        let result = optimize(b"not an image", &ImageOptions::default());
        assert!(matches!(result, Err(ProcessingError::Decode(_))));
    }
}
