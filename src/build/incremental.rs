//! Incremental build support.
//!
//! Every generated module starts with a one-line header carrying the source
//! file's modification time:
//!
//! ```text
//! /* svgbundle lastMod: '1700000000000.123' */
//! ```
//!
//! On the next build the header is read back and compared with the source
//! file. An asset is rebuilt unless the two timestamps are exactly equal.
//! Anything that prevents reading the header (missing file, unreadable file,
//! no header, garbled number) also means "rebuild"; stale output is never an
//! error.

use crate::build::asset::SourceAsset;
use crate::build::{BuildContext, BuildResult};
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/\* svgbundle lastMod: '(\d+(?:\.\d+)?)' \*/\s*$").unwrap()
});

/// The metadata header line written at the top of each generated module.
pub fn metadata_header(modified_at: f64) -> String {
    format!("/* svgbundle lastMod: '{}' */", modified_at)
}

/// Parse the timestamp out of a metadata header line.
pub fn parse_header(line: &str) -> Option<f64> {
    HEADER.captures(line)?.get(1)?.as_str().parse().ok()
}

/// Read the embedded timestamp from the first line of a generated module.
pub fn read_embedded_timestamp(path: &Path) -> Option<f64> {
    let file = File::open(path).ok()?;
    let mut first = String::new();
    BufReader::new(file).read_line(&mut first).ok()?;
    parse_header(&first)
}

/// Whether `asset` must be regenerated into `target`.
///
/// False only when `target` carries a timestamp exactly equal to the
/// asset's modification time.
pub fn is_changed(asset: &SourceAsset, target: &Path) -> bool {
    match read_embedded_timestamp(target) {
        Some(embedded) => embedded != asset.modified_at,
        None => true,
    }
}

/// Decides which assets need a rebuild.
#[derive(Debug, Clone)]
pub struct ChangeDetector<'a> {
    context: &'a BuildContext,
    force: bool,
}

impl<'a> ChangeDetector<'a> {
    /// Create a detector for a build context.
    pub fn new(context: &'a BuildContext) -> Self {
        Self { context, force: false }
    }

    /// Set force mode (every asset counts as changed).
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Check a single asset against its output file.
    pub fn needs_rebuild(&self, asset: &SourceAsset) -> bool {
        if self.force {
            return true;
        }
        let target = asset.output_path(&self.context.out_dir(), &self.context.options().ext);
        is_changed(asset, &target)
    }
}

/// Statistics about an incremental build.
#[derive(Debug, Clone, Default)]
pub struct IncrementalStats {
    /// Number of modules that were generated
    pub built: usize,
    /// Number of assets that were skipped (up to date)
    pub skipped: usize,
    /// Total number of assets
    pub total: usize,
}

impl IncrementalStats {
    /// Create stats from a build result.
    pub fn from_result(result: &BuildResult) -> Self {
        Self {
            built: result.generated_count(),
            skipped: result.skipped_count(),
            total: result.assets.len(),
        }
    }

    /// Check if any modules were rebuilt.
    pub fn had_rebuilds(&self) -> bool {
        self.built > 0
    }
}

impl std::fmt::Display for IncrementalStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} built, {} skipped ({} total)", self.built, self.skipped, self.total)
    }
}
