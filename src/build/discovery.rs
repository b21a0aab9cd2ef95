//! Source file discovery for the build system.
//!
//! Finds every `.svg` file below the configured source directory and turns
//! it into a [`SourceAsset`].

use crate::build::asset::{asset_name, modified_millis, relative_dir, SourceAsset};
use crate::build::BuildContext;
use glob::{glob, Pattern};
use std::path::{Path, PathBuf};

/// Glob pattern for asset files, relative to the source directory.
pub const ASSET_PATTERN: &str = "**/*.svg";

/// Error during source discovery.
#[derive(Debug)]
pub enum DiscoveryError {
    /// Source directory does not exist or is not a directory
    SourceNotFound(PathBuf),
    /// Invalid glob pattern
    InvalidPattern(String, glob::PatternError),
    /// A directory could not be read while scanning
    Glob(glob::GlobError),
    /// A discovered file could not be inspected
    Io(PathBuf, std::io::Error),
    /// A discovered file is not below the source directory
    OutsideSource(PathBuf),
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::SourceNotFound(path) => {
                write!(f, "Source directory not found: {}", path.display())
            }
            DiscoveryError::InvalidPattern(pattern, err) => {
                write!(f, "Invalid glob pattern '{}': {}", pattern, err)
            }
            DiscoveryError::Glob(err) => write!(f, "IO error during discovery: {}", err),
            DiscoveryError::Io(path, err) => {
                write!(f, "Failed to read {}: {}", path.display(), err)
            }
            DiscoveryError::OutsideSource(path) => {
                write!(f, "{} is not inside the source directory", path.display())
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiscoveryError::InvalidPattern(_, err) => Some(err),
            DiscoveryError::Glob(err) => Some(err),
            DiscoveryError::Io(_, err) => Some(err),
            _ => None,
        }
    }
}

/// Discover files matching a glob pattern below `base_dir`.
///
/// Any unreadable directory aborts discovery. Results are sorted.
pub fn discover_files(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let base = Pattern::escape(&base_dir.to_string_lossy());
    let full_pattern = format!("{}/{}", base.trim_end_matches('/'), pattern);

    let paths =
        glob(&full_pattern).map_err(|e| DiscoveryError::InvalidPattern(pattern.to_string(), e))?;

    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(DiscoveryError::Glob)?;
        if path.is_file() && is_svg_file(&path) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Check if a path is an SVG source file.
fn is_svg_file(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("svg"))
}

/// Discover all assets for a build.
pub fn discover_assets(ctx: &BuildContext) -> Result<Vec<SourceAsset>, DiscoveryError> {
    let src_dir = ctx.src_dir();
    if !src_dir.is_dir() {
        return Err(DiscoveryError::SourceNotFound(src_dir));
    }

    let sub_dir = ctx.options().effective_sub_dir();
    let files = discover_files(&src_dir, ASSET_PATTERN)?;

    files
        .into_iter()
        .map(|path| {
            let relative_dir = relative_dir(&src_dir, &path, Some(sub_dir))
                .ok_or_else(|| DiscoveryError::OutsideSource(path.clone()))?;
            let name =
                asset_name(&path).ok_or_else(|| DiscoveryError::OutsideSource(path.clone()))?;
            let modified_at =
                modified_millis(&path).map_err(|e| DiscoveryError::Io(path.clone(), e))?;
            Ok(SourceAsset { path, name, relative_dir, modified_at })
        })
        .collect()
}
