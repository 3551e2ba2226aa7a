//! Error types for the placeholder transform

use std::path::PathBuf;
use thiserror::Error;

/// Message carried by [`LqipError::AnalysisFailed`].
///
/// Callers only learn that placeholder generation failed; the underlying
/// cause is written to the log.
pub const ANALYSIS_FAILED_MESSAGE: &str = "ERROR";

/// Errors returned by the placeholder transform.
#[derive(Error, Debug)]
pub enum LqipError {
    /// Neither the module nor the fallback emitter output is an export statement.
    #[error("Unrecognized module export for {}: expected `export default …` or `module.exports = …`", .path.display())]
    UnrecognizedExport { path: PathBuf },

    /// A preview or palette analysis failed. The cause is logged, not carried.
    #[error("{}", ANALYSIS_FAILED_MESSAGE)]
    AnalysisFailed,

    /// Loader options could not be deserialized.
    #[error("Invalid lqip options: {0}")]
    InvalidOptions(#[source] serde_json::Error),

    /// The fallback asset emitter failed.
    #[error("Failed to emit asset {}: {message}", .path.display())]
    Emit { path: PathBuf, message: String },

    /// The placeholder record could not be serialized.
    #[error("Failed to serialize placeholder module: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl LqipError {
    pub fn unrecognized_export(path: impl Into<PathBuf>) -> Self {
        Self::UnrecognizedExport { path: path.into() }
    }

    pub fn emit(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Emit {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for fob-lqip operations.
pub type Result<T> = std::result::Result<T, LqipError>;

/// Errors produced while computing a preview or palette.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The file extension is not one of the supported image formats.
    #[error("Input file is missing or uses unsupported image format: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },

    /// Reading the image from disk failed.
    #[error("Failed to read image {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Decoding, resizing or encoding the image failed.
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),

    /// The blocking analysis task panicked or was cancelled.
    #[error("Analysis task failed: {0}")]
    Task(String),
}

impl AnalysisError {
    pub fn unsupported_format(path: impl Into<PathBuf>) -> Self {
        Self::UnsupportedFormat { path: path.into() }
    }
}
