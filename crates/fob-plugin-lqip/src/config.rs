//! Plugin configuration

use fob_lqip::{ExportStyle, LqipOptions};
use serde::{Deserialize, Serialize};

/// Options for [`crate::FobLqipPlugin`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LqipPluginOptions {
    /// Options forwarded to the loader for every image
    pub loader: LqipOptions,

    /// File extensions handled by the plugin, without the leading dot
    pub extensions: Vec<String>,

    /// Only ids containing one of these substrings are processed (empty = all)
    pub include: Vec<String>,

    /// Ids containing one of these substrings are skipped
    pub exclude: Vec<String>,
}

impl Default for LqipPluginOptions {
    fn default() -> Self {
        Self {
            // Rolldown consumes ES modules
            loader: LqipOptions::default().with_export_style(ExportStyle::Esm),
            extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl LqipPluginOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the loader options
    pub fn with_loader(mut self, loader: LqipOptions) -> Self {
        self.loader = loader;
        self
    }

    /// Replace the handled extensions
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Add an include pattern
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include.push(pattern.into());
        self
    }

    /// Add an exclude pattern
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Whether `id` has one of the handled extensions (case-insensitive)
    pub fn matches_extension(&self, id: &str) -> bool {
        let Some((_, ext)) = id.rsplit_once('.') else {
            return false;
        };
        self.extensions
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(ext))
    }

    /// Whether `id` passes the include/exclude filters
    pub fn should_process(&self, id: &str) -> bool {
        if self
            .exclude
            .iter()
            .any(|pattern| id.contains(pattern.as_str()))
        {
            return false;
        }

        self.include.is_empty()
            || self
                .include
                .iter()
                .any(|pattern| id.contains(pattern.as_str()))
    }
}
