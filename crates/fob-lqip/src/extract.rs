//! Export statement extraction
//!
//! Image modules reach the loader in one of two shapes, both produced by an
//! earlier asset handler:
//!
//! ```javascript
//! export default "data:image/png;base64,iVBORw0KGgo...";
//! module.exports = __webpack_public_path__ + "logo-1a2b3c4d.png";
//! ```
//!
//! Only the first line of the module is inspected. Anything else (raw image
//! bytes, multi-statement modules) is [`ExportMatch::Unrecognized`].

use regex::Regex;
use std::sync::LazyLock;

static DATA_URI_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:export default|module\.exports =) (?P<source>"data:[^"]*base64,(?P<payload>[^"]*)")"#,
    )
    .expect("invalid data URI export regex")
});

static EXPRESSION_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:export default|module\.exports =) (?P<source>.*)")
        .expect("invalid expression export regex")
});

/// Result of matching a module body against the known export shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportMatch {
    /// `export default "data:…;base64,…"`
    DataUriLiteral {
        /// The quoted literal, quotes included
        literal: String,
        /// The base64 payload inside the literal
        payload: String,
    },
    /// `export default <expr>` for any other expression
    ArbitraryExpression(String),
    /// The module body is not an export statement
    Unrecognized,
}

impl ExportMatch {
    /// Consume the match, returning the expression to splice.
    pub fn into_source(self) -> Option<String> {
        match self {
            ExportMatch::DataUriLiteral { literal, .. } => Some(literal),
            ExportMatch::ArbitraryExpression(expr) => Some(expr),
            ExportMatch::Unrecognized => None,
        }
    }
}

/// Match a module body against the data URI shape first, then the generic one.
pub fn extract_export(content: &str) -> ExportMatch {
    if let Some(caps) = DATA_URI_EXPORT.captures(content) {
        return ExportMatch::DataUriLiteral {
            literal: caps["source"].to_string(),
            payload: caps["payload"].to_string(),
        };
    }

    if let Some(caps) = EXPRESSION_EXPORT.captures(content) {
        // Statement terminator belongs to the old module, not the value
        let expr = caps["source"].trim().trim_end_matches(';').trim_end();
        if !expr.is_empty() {
            return ExportMatch::ArbitraryExpression(expr.to_string());
        }
    }

    ExportMatch::Unrecognized
}
