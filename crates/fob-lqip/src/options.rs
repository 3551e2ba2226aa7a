//! Loader options
//!
//! Options arrive as the raw JSON value configured for the loader. Missing keys
//! fall back to their defaults: previews are generated, palettes are not.
//!
//! The two flags are switches, not typed booleans: `base64` is only turned off
//! by a present value other than `true`, and `palette` is only turned on by
//! `true` itself. Keys meant for other loaders in the chain are ignored.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::{LqipError, Result};

/// Module syntax used for the generated placeholder module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStyle {
    /// `module.exports = …;`
    #[default]
    CommonJs,
    /// `export default …;`
    Esm,
}

impl ExportStyle {
    /// Statement prefix preceding the exported value.
    pub fn prefix(&self) -> &'static str {
        match self {
            ExportStyle::CommonJs => "module.exports = ",
            ExportStyle::Esm => "export default ",
        }
    }
}

/// Resolved options for one loader invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LqipOptions {
    /// Generate an inline base64 preview (`preSrc`)
    #[serde(default = "default_base64", deserialize_with = "literal_true")]
    pub base64: bool,

    /// Generate a dominant color palette (`palette`)
    ///
    /// Off by default since it is slower than preview generation.
    #[serde(default, deserialize_with = "literal_true")]
    pub palette: bool,

    /// Syntax of the generated module
    #[serde(default)]
    pub export_style: ExportStyle,

    /// Prefix prepended to file names by the file emitter
    #[serde(default)]
    pub public_path: String,
}

const KNOWN_KEYS: [&str; 4] = ["base64", "palette", "exportStyle", "publicPath"];

fn default_base64() -> bool {
    true
}

/// A flag is set only by the JSON literal `true`; anything else present clears it.
fn literal_true<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value == serde_json::Value::Bool(true))
}

impl Default for LqipOptions {
    fn default() -> Self {
        Self {
            base64: default_base64(),
            palette: false,
            export_style: ExportStyle::default(),
            public_path: String::new(),
        }
    }
}

impl LqipOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve options from the loader's raw JSON value.
    ///
    /// `None` and `null` both resolve to the defaults. Unknown keys are
    /// ignored. Only a malformed `exportStyle`/`publicPath` or a non-object
    /// value is rejected.
    pub fn from_value(value: Option<&serde_json::Value>) -> Result<Self> {
        match value {
            None | Some(serde_json::Value::Null) => Ok(Self::default()),
            Some(value) => {
                if let Some(map) = value.as_object() {
                    let ignored: Vec<&str> = map
                        .keys()
                        .map(String::as_str)
                        .filter(|key| !KNOWN_KEYS.contains(key))
                        .collect();
                    if !ignored.is_empty() {
                        debug!("[fob-lqip] Ignoring unknown loader options: {:?}", ignored);
                    }
                }
                Self::deserialize(value).map_err(LqipError::InvalidOptions)
            }
        }
    }

    /// Enable or disable preview generation
    pub fn with_base64(mut self, enabled: bool) -> Self {
        self.base64 = enabled;
        self
    }

    /// Enable or disable palette generation
    pub fn with_palette(mut self, enabled: bool) -> Self {
        self.palette = enabled;
        self
    }

    /// Set the generated module syntax
    pub fn with_export_style(mut self, style: ExportStyle) -> Self {
        self.export_style = style;
        self
    }

    /// Set the public path used for emitted files
    pub fn with_public_path(mut self, public_path: impl Into<String>) -> Self {
        self.public_path = public_path.into();
        self
    }
}
