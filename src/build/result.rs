//! Build result types.
//!
//! Contains types for representing the outcome of build operations.

use std::path::PathBuf;
use std::time::Duration;

/// What happened to a single asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetStatus {
    /// Module was written
    Generated,
    /// Module was already up to date
    Skipped,
    /// Module would be written (dry run)
    Planned,
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetStatus::Generated => write!(f, "generated"),
            AssetStatus::Skipped => write!(f, "skipped"),
            AssetStatus::Planned => write!(f, "planned"),
        }
    }
}

/// Result of building a single asset.
#[derive(Debug, Clone)]
pub struct AssetResult {
    /// Registered name (`relative_dir + name`)
    pub name: String,
    /// Path of the generated module
    pub output: PathBuf,
    /// Build status
    pub status: AssetStatus,
    /// Time spent transforming and writing
    pub duration: Duration,
}

impl AssetResult {
    /// Create a result for a written module.
    pub fn generated(name: String, output: PathBuf, duration: Duration) -> Self {
        Self { name, output, status: AssetStatus::Generated, duration }
    }

    /// Create a result for an up-to-date module.
    pub fn skipped(name: String, output: PathBuf) -> Self {
        Self { name, output, status: AssetStatus::Skipped, duration: Duration::ZERO }
    }

    /// Create a result for a module a dry run would write.
    pub fn planned(name: String, output: PathBuf) -> Self {
        Self { name, output, status: AssetStatus::Planned, duration: Duration::ZERO }
    }
}

/// Result of a complete build run.
#[derive(Debug, Default)]
pub struct BuildResult {
    /// Results for each discovered asset, in discovery order
    pub assets: Vec<AssetResult>,
    /// Index files written
    pub indexes: Vec<PathBuf>,
    /// Total build duration
    pub total_duration: Duration,
}

impl BuildResult {
    /// Create a new empty build result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset result.
    pub fn add_result(&mut self, result: AssetResult) {
        self.assets.push(result);
    }

    /// Set the total duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.total_duration = duration;
        self
    }

    fn count(&self, status: AssetStatus) -> usize {
        self.assets.iter().filter(|r| r.status == status).count()
    }

    /// Number of modules written.
    pub fn generated_count(&self) -> usize {
        self.count(AssetStatus::Generated)
    }

    /// Number of up-to-date assets.
    pub fn skipped_count(&self) -> usize {
        self.count(AssetStatus::Skipped)
    }

    /// Number of modules a dry run would write.
    pub fn planned_count(&self) -> usize {
        self.count(AssetStatus::Planned)
    }

    /// Paths of all modules written in this run.
    pub fn generated_outputs(&self) -> Vec<&PathBuf> {
        self.assets
            .iter()
            .filter(|r| r.status == AssetStatus::Generated)
            .map(|r| &r.output)
            .collect()
    }

    /// Format a summary of the build result.
    pub fn summary(&self) -> String {
        let total = self.assets.len();
        let planned = self.planned_count();

        if planned > 0 {
            return format!(
                "Dry run: {} to generate, {} up to date ({} total)",
                planned,
                self.skipped_count(),
                total
            );
        }

        let mut summary = format!(
            "Build succeeded: {} generated, {} skipped ({} total) in {:?}",
            self.generated_count(),
            self.skipped_count(),
            total,
            self.total_duration
        );
        if !self.indexes.is_empty() {
            summary.push_str(&format!(", {} index files written", self.indexes.len()));
        }
        summary
    }
}
