//! Module templates.
//!
//! A template is plain text with `${field}` placeholders. The bundled
//! defaults register one icon with the consumer runtime; projects can point
//! `build.template` at their own file.
//!
//! ```ignore
//! use svgbundle::templates::{compile, TemplateFields, DEFAULT_ES6_TEMPLATE};
//!
//! let fields = TemplateFields::new().set("name", "star").set("width", 24);
//! let module = compile(DEFAULT_ES6_TEMPLATE, &fields);
//! ```

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::LazyLock;

/// Default template using ES module syntax.
pub const DEFAULT_ES6_TEMPLATE: &str = include_str!("icon.es6.tpl");

/// Default template using CommonJS syntax.
pub const DEFAULT_CJS_TEMPLATE: &str = include_str!("icon.cjs.tpl");

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{(\w+)\}").unwrap());

/// The bundled template for the requested module syntax.
pub fn default_template(es6: bool) -> &'static str {
    if es6 {
        DEFAULT_ES6_TEMPLATE
    } else {
        DEFAULT_CJS_TEMPLATE
    }
}

/// Values substituted into a template, keyed by placeholder name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateFields {
    values: BTreeMap<String, String>,
}

impl TemplateFields {
    /// Create an empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field to the display form of `value`.
    pub fn set(mut self, name: &str, value: impl Display) -> Self {
        self.values.insert(name.to_string(), value.to_string());
        self
    }

    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Replace every `${name}` with its field value.
///
/// Unknown or empty fields become the empty string. No escaping is applied.
pub fn compile(template: &str, fields: &TemplateFields) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| fields.get(&caps[1]).unwrap_or("").to_string())
        .into_owned()
}
