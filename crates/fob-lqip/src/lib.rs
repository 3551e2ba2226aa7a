//! Low-quality image placeholders for bundled image modules
//!
//! An image module exporting its URL (or a data URI) is rewritten to export
//! an object carrying the original reference plus a tiny inline preview and
//! optionally the image's dominant colors:
//!
//! ```javascript
//! // before
//! export default "/assets/hero-1a2b3c4d.png";
//! // after
//! module.exports = {"src":"/assets/hero-1a2b3c4d.png","preSrc":"data:image/png;base64,…","palette":null};
//! ```
//!
//! The pieces are separate seams so hosts can swap them:
//!
//! - [`LoaderContext`] - what the host knows about the module being loaded
//! - [`AssetEmitter`] - turns raw image bytes into an export statement
//! - [`PlaceholderAnalyzer`] - computes previews and palettes
//!
//! [`LqipLoader`] ties them together.

pub mod analysis;
pub mod context;
pub mod emit;
pub mod error;
pub mod extract;
pub mod loader;
pub mod options;
pub mod output;
pub mod palette;

#[cfg(feature = "logging")]
pub mod logging;

pub use analysis::{ImageAnalyzer, PlaceholderAnalyzer};
pub use context::{EmittedFile, LoaderContext, MemoryLoaderContext};
pub use emit::{AssetEmitter, FileAssetEmitter, InlineAssetEmitter};
pub use error::{ANALYSIS_FAILED_MESSAGE, AnalysisError, LqipError, Result};
pub use extract::{ExportMatch, extract_export};
pub use loader::LqipLoader;
pub use options::{ExportStyle, LqipOptions};
pub use output::PlaceholderModule;
