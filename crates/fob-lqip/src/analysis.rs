//! Placeholder analyses
//!
//! [`PlaceholderAnalyzer`] is the seam between the loader and whatever
//! computes previews and palettes. [`ImageAnalyzer`] is the default,
//! built on the `image` crate.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, ImageFormat, imageops::FilterType};
use std::io::Cursor;
use std::path::Path;

use crate::error::AnalysisError;
use crate::palette;

/// Computes placeholder data for an image on disk.
#[async_trait]
pub trait PlaceholderAnalyzer: Send + Sync {
    /// Tiny preview of the image as a `data:` URI.
    async fn preview(&self, path: &Path) -> Result<String, AnalysisError>;

    /// Dominant colors as hex strings, most popular first.
    async fn palette(&self, path: &Path) -> Result<Vec<String>, AnalysisError>;
}

/// Default analyzer decoding images from disk.
///
/// Previews are resized to [`ImageAnalyzer::DEFAULT_PREVIEW_WIDTH`] pixels wide
/// and re-encoded in the source format; only PNG and JPEG sources are accepted.
#[derive(Debug, Clone)]
pub struct ImageAnalyzer {
    preview_width: u32,
    palette_size: usize,
}

impl ImageAnalyzer {
    pub const DEFAULT_PREVIEW_WIDTH: u32 = 10;
    pub const DEFAULT_PALETTE_SIZE: usize = 6;

    pub fn new() -> Self {
        Self {
            preview_width: Self::DEFAULT_PREVIEW_WIDTH,
            palette_size: Self::DEFAULT_PALETTE_SIZE,
        }
    }

    /// Set the preview width in pixels (at least 1)
    pub fn with_preview_width(mut self, width: u32) -> Self {
        self.preview_width = width.max(1);
        self
    }

    /// Set the maximum number of palette colors
    pub fn with_palette_size(mut self, size: usize) -> Self {
        self.palette_size = size;
        self
    }
}

impl Default for ImageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaceholderAnalyzer for ImageAnalyzer {
    async fn preview(&self, path: &Path) -> Result<String, AnalysisError> {
        let (format, mime) = preview_format(path)?;
        let path = path.to_path_buf();
        let width = self.preview_width;

        run_blocking(move || {
            let image = decode(&path, Some(format))?;
            let bytes = encode_preview(&image, format, width)?;
            Ok(format!(
                "data:{};base64,{}",
                mime,
                general_purpose::STANDARD.encode(bytes)
            ))
        })
        .await
    }

    async fn palette(&self, path: &Path) -> Result<Vec<String>, AnalysisError> {
        let path = path.to_path_buf();
        let size = self.palette_size;

        run_blocking(move || {
            let image = decode(&path, None)?;
            Ok(palette::dominant_colors(&image, size))
        })
        .await
    }
}

/// Output format and MIME type for a preview, by source extension.
fn preview_format(path: &Path) -> Result<(ImageFormat, &'static str), AnalysisError> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => Ok((ImageFormat::Png, "image/png")),
        Some("jpg") | Some("jpeg") => Ok((ImageFormat::Jpeg, "image/jpeg")),
        _ => Err(AnalysisError::unsupported_format(path)),
    }
}

fn decode(path: &Path, format: Option<ImageFormat>) -> Result<DynamicImage, AnalysisError> {
    let bytes = std::fs::read(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let image = match format {
        Some(format) => image::load_from_memory_with_format(&bytes, format)?,
        None => image::load_from_memory(&bytes)?,
    };
    Ok(image)
}

/// Resize to `width` keeping the aspect ratio, then encode as `format`.
fn encode_preview(
    image: &DynamicImage,
    format: ImageFormat,
    width: u32,
) -> Result<Vec<u8>, AnalysisError> {
    let height = (image.height() as u64 * width as u64 / image.width().max(1) as u64).max(1);
    let resized = image.resize_exact(width, height as u32, FilterType::Triangle);

    // JPEG has no alpha channel
    let resized = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
        _ => resized,
    };

    let mut buf = Vec::new();
    resized.write_to(&mut Cursor::new(&mut buf), format)?;
    Ok(buf)
}

async fn run_blocking<T, F>(f: F) -> Result<T, AnalysisError>
where
    F: FnOnce() -> Result<T, AnalysisError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AnalysisError::Task(e.to_string()))?
}
