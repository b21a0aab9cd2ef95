//! Identifier namespacing.
//!
//! Every generated module is registered into one shared runtime scope, so an
//! id such as `svgiconGradient` used by two different source files would
//! clash. Ids that start with the reserved prefix are rewritten to embed the
//! asset's relative directory and name.

use regex::{Captures, Regex};

/// Rewrites reserved identifiers inside a single asset's markup.
#[derive(Debug, Clone)]
pub struct IdNamespacer {
    prefix: String,
    separator: String,
    pattern: Regex,
}

impl IdNamespacer {
    /// Create a namespacer for ids of the form `<prefix><word>`.
    pub fn new(prefix: &str, separator: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r"{}(\w+)", regex::escape(prefix)))?;
        Ok(Self { prefix: prefix.to_string(), separator: separator.to_string(), pattern })
    }

    /// The reserved prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The separator placed between the prefix, the namespace key and the suffix.
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Whether the markup contains any reserved identifier.
    pub fn matches(&self, markup: &str) -> bool {
        self.pattern.is_match(markup)
    }

    /// Rewrite every `<prefix><suffix>` to `<prefix><sep><key><sep><suffix>`,
    /// where the key is built by [`namespace_key`].
    pub fn namespace(&self, markup: &str, relative_dir: &str, name: &str) -> String {
        let key = namespace_key(relative_dir, name, &self.separator);
        self.pattern
            .replace_all(markup, |caps: &Captures| {
                format!("{}{}{}{}{}", self.prefix, self.separator, key, self.separator, &caps[1])
            })
            .into_owned()
    }
}

/// The unique part of a namespaced id: the relative directory with path
/// separators replaced by `separator`, followed by the asset name.
pub fn namespace_key(relative_dir: &str, name: &str, separator: &str) -> String {
    let dir = relative_dir.replace(['/', '\\'], separator);
    format!("{}{}", dir, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namespacer() -> IdNamespacer {
        IdNamespacer::new("svgicon", "_").unwrap()
    }

    #[test]
    fn test_namespace_root_asset() {
        let out = namespacer().namespace(r#"<path id="svgiconFill"/>"#, "", "star");
        assert_eq!(out, r#"<path id="svgicon_star_Fill"/>"#);
    }

    #[test]
    fn test_namespace_nested_asset() {
        let out = namespacer().namespace(r#"<path id="svgiconFill"/>"#, "ui/arrows/", "left");
        assert_eq!(out, r#"<path id="svgicon_ui_arrows_left_Fill"/>"#);
    }

    #[test]
    fn test_namespace_rewrites_references() {
        let markup = r##"<linearGradient id="svgiconA"/><path fill="url(#svgiconA)"/>"##;
        let out = namespacer().namespace(markup, "", "logo");
        assert_eq!(
            out,
            r##"<linearGradient id="svgicon_logo_A"/><path fill="url(#svgicon_logo_A)"/>"##
        );
    }

    #[test]
    fn test_namespace_ignores_other_ids() {
        let markup = r#"<path id="main"/><path id="svgicon"/>"#;
        assert_eq!(namespacer().namespace(markup, "", "x"), markup);
    }

    #[test]
    fn test_namespace_custom_separator() {
        let ns = IdNamespacer::new("svgicon", "-").unwrap();
        let out = ns.namespace(r#"id="svgiconMask""#, "a\\b/", "c");
        assert_eq!(out, r#"id="svgicon-a-b-c-Mask""#);
    }

    #[test]
    fn test_namespace_distinct_assets_never_collide() {
        let ns = namespacer();
        let markup = r#"<path id="svgiconFill"/>"#;
        let pairs = [
            (("a/", "icon"), ("b/", "icon")),
            (("", "star"), ("", "heart")),
            (("a/", "icon"), ("", "icon")),
        ];
        for ((dir_a, name_a), (dir_b, name_b)) in pairs {
            assert_ne!(ns.namespace(markup, dir_a, name_a), ns.namespace(markup, dir_b, name_b));
        }
    }

    #[test]
    fn test_namespace_key() {
        assert_eq!(namespace_key("sub/", "icon", "_"), "sub_icon");
        assert_eq!(namespace_key("", "icon", "_"), "icon");
    }

    #[test]
    fn test_matches_reserved_ids_only() {
        let ns = namespacer();
        assert!(ns.matches(r#"<path id="svgiconFill"/>"#));
        assert!(!ns.matches(r#"<path id="main"/><g id="svgicon"/>"#));
    }
}
