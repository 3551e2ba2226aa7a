//! The placeholder injection loader
//!
//! ## Flow
//!
//! ```text
//! module bytes → extract export ─┬→ found ──────────────────────┐
//!                                └→ none → emitter → extract ───┤
//!                                                               v
//!               preview (base64) ┐                      asset reference
//!               palette          ┴→ join (both finish) → {src, preSrc, palette} module
//! ```

use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

use crate::analysis::{ImageAnalyzer, PlaceholderAnalyzer};
use crate::context::LoaderContext;
use crate::emit::{AssetEmitter, FileAssetEmitter};
use crate::error::{AnalysisError, LqipError, Result};
use crate::extract::{ExportMatch, extract_export};
use crate::options::LqipOptions;
use crate::output::PlaceholderModule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnalysisKind {
    Preview,
    Palette,
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisKind::Preview => write!(f, "preview"),
            AnalysisKind::Palette => write!(f, "palette"),
        }
    }
}

/// Rewrites an image module so it exports `{ src, preSrc, palette }`.
///
/// # Example
///
/// ```rust,no_run
/// use fob_lqip::{LqipLoader, MemoryLoaderContext};
/// use serde_json::json;
///
/// # async fn example() -> fob_lqip::Result<()> {
/// let ctx = MemoryLoaderContext::new("/project/src/hero.png")
///     .with_options(json!({ "palette": true }));
/// let module = LqipLoader::new()
///     .run(&ctx, b"export default \"/assets/hero.png\";")
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LqipLoader {
    analyzer: Arc<dyn PlaceholderAnalyzer>,
    emitter: Arc<dyn AssetEmitter>,
}

impl LqipLoader {
    /// Loader using [`ImageAnalyzer`] and [`FileAssetEmitter`]
    pub fn new() -> Self {
        Self {
            analyzer: Arc::new(ImageAnalyzer::new()),
            emitter: Arc::new(FileAssetEmitter),
        }
    }

    /// Replace the analyzer computing previews and palettes
    pub fn with_analyzer(mut self, analyzer: impl PlaceholderAnalyzer + 'static) -> Self {
        self.analyzer = Arc::new(analyzer);
        self
    }

    /// Replace the emitter used when the module is not an export statement
    pub fn with_emitter(mut self, emitter: impl AssetEmitter + 'static) -> Self {
        self.emitter = Arc::new(emitter);
        self
    }

    /// Transform one image module.
    ///
    /// Analyses that are not enabled are never started. Enabled analyses run
    /// concurrently and are always driven to completion, even when the other
    /// one fails. Every failure is logged with its cause, then
    /// [`LqipError::AnalysisFailed`] is returned and no module is produced.
    pub async fn run(&self, ctx: &dyn LoaderContext, content: &[u8]) -> Result<String> {
        ctx.cacheable(true);

        let options = LqipOptions::from_value(ctx.options())?;
        let path = ctx.resource_path();
        let src = self.resolve_source(ctx, content, &options)?;

        debug!(
            "[fob-lqip] Transforming {} (base64: {}, palette: {})",
            path.display(),
            options.base64,
            options.palette
        );

        let preview = async {
            if options.base64 {
                self.analyzer
                    .preview(path)
                    .await
                    .map(Some)
                    .map_err(|e| (AnalysisKind::Preview, e))
            } else {
                Ok(None)
            }
        };

        let palette = async {
            if options.palette {
                self.analyzer
                    .palette(path)
                    .await
                    .map(Some)
                    .map_err(|e| (AnalysisKind::Palette, e))
            } else {
                Ok(None)
            }
        };

        let (pre_src, palette) = match tokio::join!(preview, palette) {
            (Ok(pre_src), Ok(palette)) => (pre_src, palette),
            (preview, palette) => {
                for (kind, err) in [preview.err(), palette.err()].into_iter().flatten() {
                    log_analysis_failure(path, kind, &err);
                }
                return Err(LqipError::AnalysisFailed);
            }
        };

        let module = PlaceholderModule {
            src,
            pre_src,
            palette,
        };
        module.render(options.export_style)
    }

    /// Transform one image module and report the outcome to `callback`.
    ///
    /// The callback is invoked exactly once.
    pub async fn run_with_callback<F>(&self, ctx: &dyn LoaderContext, content: &[u8], callback: F)
    where
        F: FnOnce(Result<String>),
    {
        callback(self.run(ctx, content).await);
    }

    /// Find the exported asset reference, emitting the asset first if needed.
    fn resolve_source(
        &self,
        ctx: &dyn LoaderContext,
        content: &[u8],
        options: &LqipOptions,
    ) -> Result<String> {
        let text = String::from_utf8_lossy(content);
        let matched = extract_export(&text);
        if let ExportMatch::DataUriLiteral { payload, .. } = &matched {
            debug!(
                "[fob-lqip] {} is already inlined ({} base64 chars)",
                ctx.resource_path().display(),
                payload.len()
            );
        }
        if let Some(src) = matched.into_source() {
            return Ok(src);
        }

        debug!(
            "[fob-lqip] No export in {}, emitting asset",
            ctx.resource_path().display()
        );
        let emitted = self.emitter.emit(ctx, content, options)?;

        extract_export(&emitted)
            .into_source()
            .ok_or_else(|| LqipError::unrecognized_export(ctx.resource_path()))
    }
}

impl Default for LqipLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LqipLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LqipLoader").finish_non_exhaustive()
    }
}

fn log_analysis_failure(path: &std::path::Path, kind: AnalysisKind, err: &AnalysisError) {
    error!(
        "[fob-lqip] {} generation failed for {}: {}",
        kind,
        path.display(),
        err
    );
}
