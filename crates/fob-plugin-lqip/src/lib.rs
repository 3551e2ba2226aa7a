//! Rolldown plugin for low-quality image placeholders
//!
//! Image imports resolve to an object instead of a bare URL:
//!
//! ```javascript
//! import hero from './hero.png';
//! // hero = { src: "data:image/png;base64,…", preSrc: "data:image/png;base64,…", palette: null }
//! ```
//!
//! The `load` hook reads the image, inlines it as a data URI and runs the
//! [`fob_lqip::LqipLoader`] over the result.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fob_plugin_lqip::{FobLqipPlugin, LqipPluginOptions};
//! use fob_lqip::LqipOptions;
//! use std::sync::Arc;
//!
//! let options = LqipPluginOptions::new()
//!     .with_loader(LqipOptions::new().with_palette(true))
//!     .exclude("icons/");
//! let plugin = Arc::new(FobLqipPlugin::with_options(options));
//! ```

use anyhow::Context;
use fob_lqip::{EmittedFile, LqipLoader, MemoryLoaderContext};
use rolldown_common::{EmittedAsset, ModuleType};
use rolldown_plugin::{HookLoadArgs, HookLoadOutput, HookLoadReturn, Plugin, PluginContext};
use std::borrow::Cow;
use tracing::debug;

mod config;
pub use config::LqipPluginOptions;

/// Rolldown plugin injecting placeholders into image modules
#[derive(Debug, Clone)]
pub struct FobLqipPlugin {
    options: LqipPluginOptions,
    loader: LqipLoader,
}

impl FobLqipPlugin {
    /// Create a plugin with default options
    pub fn new() -> Self {
        Self::with_options(LqipPluginOptions::default())
    }

    /// Create a plugin with custom options
    pub fn with_options(options: LqipPluginOptions) -> Self {
        Self {
            options,
            loader: LqipLoader::new(),
        }
    }

    /// Replace the loader, e.g. to use a custom analyzer or inline emitter
    pub fn with_loader(mut self, loader: LqipLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn options(&self) -> &LqipPluginOptions {
        &self.options
    }

    fn handles(&self, id: &str) -> bool {
        self.options.matches_extension(id) && self.options.should_process(id)
    }
}

impl Default for FobLqipPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for FobLqipPlugin {
    fn name(&self) -> Cow<'static, str> {
        "fob-lqip".into()
    }

    fn register_hook_usage(&self) -> rolldown_plugin::HookUsage {
        rolldown_plugin::HookUsage::Load
    }

    /// Load hook - turns image files into placeholder modules
    ///
    /// # Returns
    ///
    /// - `Ok(Some(output))` - Image transformed into a JS module
    /// - `Ok(None)` - Not an image handled by this plugin
    /// - `Err(e)` - Reading, placeholder generation or asset emission failed
    fn load(
        &self,
        ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let id = args.id.to_string();
        let handles = self.handles(&id);
        let loader = self.loader.clone();
        let loader_options = serde_json::to_value(&self.options.loader);

        async move {
            if !handles {
                return Ok(None);
            }

            let loader_options =
                loader_options.context("Failed to serialize lqip loader options")?;
            let content =
                std::fs::read(&id).with_context(|| format!("Failed to read image: {}", id))?;

            let loader_ctx = MemoryLoaderContext::new(&id).with_options(loader_options);
            let code = loader
                .run(&loader_ctx, &content)
                .await
                .with_context(|| format!("Failed to generate placeholder for: {}", id))?;

            for file in loader_ctx.take_emitted_files() {
                emit_to_rolldown(ctx, &id, file)?;
            }

            debug!(
                "[fob-lqip] Processed {} ({} → {} bytes)",
                id,
                content.len(),
                code.len()
            );

            Ok(Some(HookLoadOutput {
                code: code.into(),
                module_type: Some(ModuleType::Js),
                ..Default::default()
            }))
        }
    }
}

/// Hand a loader-emitted file to Rolldown under its exact name
///
/// The module code already references `file.name`, so Rolldown must not
/// rename it with its own asset pattern.
fn emit_to_rolldown(ctx: &PluginContext, id: &str, file: EmittedFile) -> anyhow::Result<()> {
    let EmittedFile { name, content } = file;
    let size = content.len();

    let reference_id = ctx
        .emit_file(
            EmittedAsset {
                name: Some(name.clone()),
                original_file_name: Some(id.to_string()),
                file_name: Some(name.clone().into()),
                source: content.into(),
            },
            None,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Failed to emit asset {} for {}: {}", name, id, e))?;

    debug!(
        "[fob-lqip] Emitted {} ({} bytes, ref {})",
        name, size, reference_id
    );
    Ok(())
}
