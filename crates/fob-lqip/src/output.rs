//! Placeholder module serialization

use serde::Serialize;

use crate::error::{LqipError, Result};
use crate::options::ExportStyle;

/// Token written in place of `src` before the raw expression is spliced in.
const SRC_TOKEN: &str = "__FOB_LQIP_SRC__";

/// Value exported by a transformed image module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderModule {
    /// Original export expression, emitted verbatim
    pub src: String,
    /// Inline preview data URI
    pub pre_src: Option<String>,
    /// Dominant colors, most popular first
    pub palette: Option<Vec<String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Record<'a> {
    src: &'static str,
    pre_src: &'a Option<String>,
    palette: &'a Option<Vec<String>>,
}

impl PlaceholderModule {
    /// Render as a module export statement.
    ///
    /// `src` is an expression rather than a string value, so it is spliced in
    /// after JSON serialization instead of being escaped.
    pub fn render(&self, style: ExportStyle) -> Result<String> {
        let record = Record {
            src: SRC_TOKEN,
            pre_src: &self.pre_src,
            palette: &self.palette,
        };
        let json = serde_json::to_string(&record).map_err(LqipError::Serialize)?;
        // `src` is the first field, so the first occurrence is always the token
        let quoted_token = format!("\"{}\"", SRC_TOKEN);
        let object = json.replacen(&quoted_token, &self.src, 1);

        Ok(format!("{}{};", style.prefix(), object))
    }
}
