//! Markup rewriting applied to optimized SVG before it is embedded in a module.
//!
//! The transforms run in a fixed order on each asset:
//! 1. [`strip_svg_wrapper`] removes the outer `<svg>` element
//! 2. [`styles::rename_styles`] (optional) prefixes presentation attributes
//! 3. [`namespace::IdNamespacer`] makes reserved identifiers bundle-unique
//! 4. [`escape_single_quoted`] makes the result safe inside a `'...'` literal

pub mod namespace;
pub mod styles;

pub use namespace::*;
pub use styles::*;

use regex::Regex;
use std::sync::LazyLock;

static SVG_OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<svg\b[^>]*>").unwrap());
static SVG_CLOSE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</svg\s*>").unwrap());

/// Remove `<svg ...>` and `</svg>` tags, keeping only the inner markup.
pub fn strip_svg_wrapper(markup: &str) -> String {
    let without_open = SVG_OPEN_TAG.replace_all(markup, "");
    SVG_CLOSE_TAG.replace_all(&without_open, "").into_owned()
}

/// Escape markup for embedding inside a single-quoted JavaScript string.
///
/// Backslashes are escaped first so existing escapes survive; line breaks
/// become `\n` since a quoted literal cannot span lines.
pub fn escape_single_quoted(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    for c in markup.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}
