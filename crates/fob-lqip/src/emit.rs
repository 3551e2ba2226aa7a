//! Fallback asset emitters
//!
//! When the incoming module is raw image bytes rather than an export
//! statement, an [`AssetEmitter`] turns the bytes into one. The emitted module
//! must be one of the shapes understood by [`crate::extract_export`].

use base64::{Engine as _, engine::general_purpose};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::context::LoaderContext;
use crate::error::{LqipError, Result};
use crate::options::LqipOptions;

/// Produces an export statement for an asset the host has not handled yet.
pub trait AssetEmitter: Send + Sync {
    /// Emit `content` and return the module source referencing it.
    fn emit(
        &self,
        ctx: &dyn LoaderContext,
        content: &[u8],
        options: &LqipOptions,
    ) -> Result<String>;
}

/// Inlines the asset as a base64 data URI.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineAssetEmitter;

impl AssetEmitter for InlineAssetEmitter {
    fn emit(
        &self,
        ctx: &dyn LoaderContext,
        content: &[u8],
        _options: &LqipOptions,
    ) -> Result<String> {
        let mime = mime_for_path(ctx.resource_path());
        let encoded = general_purpose::STANDARD.encode(content);
        Ok(format!("export default \"data:{};base64,{}\";", mime, encoded))
    }
}

/// Emits the asset as a separate content-hashed file.
///
/// The file is named `[stem]-[hash8].[ext]` and handed to
/// [`LoaderContext::emit_file`]; the module exports its public URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileAssetEmitter;

impl AssetEmitter for FileAssetEmitter {
    fn emit(
        &self,
        ctx: &dyn LoaderContext,
        content: &[u8],
        options: &LqipOptions,
    ) -> Result<String> {
        let path = ctx.resource_path();
        let filename = hashed_filename(path, content)?;
        ctx.emit_file(&filename, content.to_vec());

        let url = format!("{}{}", options.public_path, filename);
        let literal = serde_json::to_string(&url).map_err(LqipError::Serialize)?;
        Ok(format!("export default {};", literal))
    }
}

/// Hash asset content using SHA-256.
///
/// Returns hex-encoded hash (64 characters).
fn hash_content(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Generate `[stem]-[hash8].[ext]` for the asset.
fn hashed_filename(path: &Path, content: &[u8]) -> Result<String> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| LqipError::emit(path, "asset path has no file name"))?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");

    let hash = hash_content(content);
    let hash_short = &hash[..8];

    if ext.is_empty() {
        Ok(format!("{}-{}", stem, hash_short))
    } else {
        Ok(format!("{}-{}.{}", stem, hash_short, ext))
    }
}

/// MIME type for an image path, by extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
