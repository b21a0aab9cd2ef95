//! Build context containing configuration and state for a build.

use crate::config::BuildOptions;
use std::path::{Path, PathBuf};

/// Default number of parallel jobs (uses available parallelism).
fn default_jobs() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Build context containing configuration and paths for a build operation.
///
/// Relative paths in the options are resolved against the project root
/// (the directory holding `svgbundle.toml`, or the working directory).
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The build options
    options: BuildOptions,
    /// Project root directory
    project_root: PathBuf,
    /// Whether to run in verbose mode
    verbose: bool,
}

impl BuildContext {
    /// Create a new build context.
    pub fn new(options: BuildOptions, project_root: PathBuf) -> Self {
        Self { options, project_root, verbose: false }
    }

    /// Get the build options.
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Source directory scanned for assets (resolved to absolute path).
    pub fn src_dir(&self) -> PathBuf {
        self.resolve_path(&self.options.source_path)
    }

    /// Output directory for generated modules (resolved to absolute path).
    pub fn out_dir(&self) -> PathBuf {
        self.resolve_path(&self.options.target_path)
    }

    /// Custom template path, if configured (resolved to absolute path).
    pub fn template_path(&self) -> Option<PathBuf> {
        self.options.template.as_deref().map(|p| self.resolve_path(p))
    }

    /// Number of parallel workers.
    pub fn jobs(&self) -> usize {
        self.options.jobs.unwrap_or_else(default_jobs).max(1)
    }

    /// Whether verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Resolve a path relative to the project root.
    ///
    /// If the path is absolute, returns it unchanged.
    /// If relative, joins it with the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        crate::config::loader::resolve_path(&self.project_root, path)
    }
}
