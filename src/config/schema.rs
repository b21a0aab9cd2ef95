//! Configuration schema types for `svgbundle.toml`
//!
//! Defines the structure and validation rules for svgbundle project configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::optimizer::OptimizerSettings;

/// Optimizer configuration as written in `svgbundle.toml`.
///
/// Either a path to a JSON or TOML settings file (resolved against the
/// process working directory) or an inline table of settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptimizerConfig {
    /// Path to a settings file
    Path(PathBuf),
    /// Inline settings table
    Inline(OptimizerSettings),
}

/// Options for a single build invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Root directory scanned for `.svg` files
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,
    /// Root directory generated modules are written to
    #[serde(default = "default_target_path")]
    pub target_path: PathBuf,
    /// Extension of generated modules and indexes (without the dot)
    #[serde(default = "default_ext")]
    pub ext: String,
    /// Emit ES module syntax (`import`) instead of CommonJS (`require`)
    #[serde(default = "default_true")]
    pub es6: bool,
    /// Custom module template, relative to the project root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
    /// Leading directory stripped from every asset's relative path.
    /// Falls back to `source_path` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_dir: Option<PathBuf>,
    /// Separator used when namespacing element identifiers
    #[serde(default = "default_id_separator")]
    pub id_separator: String,
    /// Reserved identifier prefix that marks ids to be namespaced
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
    /// Optimizer settings (defaults when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer: Option<OptimizerConfig>,
    /// Prefix `fill`/`stroke` on drawable elements with an underscore
    #[serde(default)]
    pub rename_styles: bool,
    /// Lint-disable comment written at the top of index files, keyed by extension
    #[serde(default = "default_lint_headers")]
    pub lint_headers: BTreeMap<String, String>,
    /// Number of parallel workers (defaults to available parallelism)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

fn default_source_path() -> PathBuf {
    PathBuf::from("assets/svg")
}

fn default_target_path() -> PathBuf {
    PathBuf::from("assets/svg/bundle")
}

fn default_ext() -> String {
    "js".to_string()
}

fn default_true() -> bool {
    true
}

fn default_id_separator() -> String {
    "_".to_string()
}

fn default_id_prefix() -> String {
    "svgicon".to_string()
}

/// Lint headers recognized out of the box.
pub fn default_lint_headers() -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("js".to_string(), "/* eslint-disable */".to_string());
    headers.insert("ts".to_string(), "/* tslint:disable */".to_string());
    headers
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            source_path: default_source_path(),
            target_path: default_target_path(),
            ext: default_ext(),
            es6: true,
            template: None,
            sub_dir: None,
            id_separator: default_id_separator(),
            id_prefix: default_id_prefix(),
            optimizer: None,
            rename_styles: false,
            lint_headers: default_lint_headers(),
            jobs: None,
        }
    }
}

impl BuildOptions {
    /// The prefix stripped from relative asset directories.
    pub fn effective_sub_dir(&self) -> &Path {
        self.sub_dir.as_deref().unwrap_or(&self.source_path)
    }

    /// Lint-disable header for the configured extension, if one is known.
    pub fn lint_header(&self) -> Option<&str> {
        self.lint_headers.get(&self.ext).map(String::as_str)
    }
}

/// Watch mode configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce delay in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
    /// Clear terminal between rebuilds
    #[serde(default = "default_true")]
    pub clear_screen: bool,
}

fn default_debounce_ms() -> u32 {
    100
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            clear_screen: true,
        }
    }
}

/// Complete svgbundle.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SvgBundleConfig {
    /// Build options
    #[serde(default)]
    pub build: BuildOptions,
    /// Watch mode settings
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "build.ext")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "svgbundle.toml: '{}' {}", self.field, self.message)
    }
}

impl SvgBundleConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let build = &self.build;

        if build.ext.is_empty() {
            errors.push(ConfigValidationError {
                field: "build.ext".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        } else if build.ext.contains(['.', '/', '\\']) {
            errors.push(ConfigValidationError {
                field: "build.ext".to_string(),
                message: "must be a bare extension without dots or separators".to_string(),
            });
        }

        if build.id_separator.is_empty() {
            errors.push(ConfigValidationError {
                field: "build.id_separator".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        } else if build.id_separator.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'') {
            errors.push(ConfigValidationError {
                field: "build.id_separator".to_string(),
                message: "must not contain whitespace or quotes".to_string(),
            });
        }

        if build.id_prefix.is_empty()
            || !build.id_prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            errors.push(ConfigValidationError {
                field: "build.id_prefix".to_string(),
                message: "must be a non-empty word (letters, digits, underscores)".to_string(),
            });
        }

        if build.jobs == Some(0) {
            errors.push(ConfigValidationError {
                field: "build.jobs".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        if build.source_path.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "build.source_path".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if build.target_path.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "build.target_path".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
