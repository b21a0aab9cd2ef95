//! Presentation attribute renaming.
//!
//! With `rename_styles` enabled, `fill="..."` and `stroke="..."` on drawable
//! elements become `_fill="..."` and `_stroke="..."`. The runtime can then
//! decide per icon whether the original colors or a stylesheet win.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Opening tags of drawable elements. Matches a single tag only.
static DRAWABLE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(?:path|rect|circle|polygon|line|polyline|g|ellipse)\b[^>]*>").unwrap()
});

/// `fill=` or `stroke=` as a whole attribute name, either quote style.
static STYLE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(\s)(fill|stroke)=(["'])"#).unwrap());

/// Prefix `fill` and `stroke` attributes on drawable elements with `_`.
pub fn rename_styles(markup: &str) -> String {
    DRAWABLE_TAG
        .replace_all(markup, |tag: &Captures| {
            STYLE_ATTR.replace_all(&tag[0], "${1}_${2}=${3}").into_owned()
        })
        .into_owned()
}
