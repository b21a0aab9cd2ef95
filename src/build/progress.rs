//! Build progress reporting.
//!
//! The pipeline reports what it does through a [`ProgressReporter`]. The CLI
//! picks a console reporter (with colors) or a JSON-lines reporter; library
//! callers and tests usually pass [`NullProgress`].
//!
//! # Example
//!
//! ```ignore
//! use svgbundle::build::progress::{ConsoleProgress, ProgressEvent, ProgressReporter};
//!
//! let reporter = ConsoleProgress::new();
//! reporter.report(ProgressEvent::BuildStarted { total_assets: 10, changed: 2 });
//! reporter.report(ProgressEvent::ModuleGenerated {
//!     name: "sub/star".to_string(),
//!     output: "assets/svg/bundle/sub/star.js".into(),
//!     duration_ms: 3,
//! });
//! ```

use serde_json::{json, Value};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Events that can be reported during a build.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Discovery finished and the build is about to transform assets
    BuildStarted {
        /// Number of discovered assets
        total_assets: usize,
        /// Number of assets that need a rebuild
        changed: usize,
    },
    /// A module was written
    ModuleGenerated {
        /// Registered name of the asset
        name: String,
        /// Path of the written module
        output: PathBuf,
        /// Duration in milliseconds
        duration_ms: u64,
    },
    /// A module would be written (dry run)
    ModulePlanned {
        /// Registered name of the asset
        name: String,
        /// Path the module would be written to
        output: PathBuf,
    },
    /// An asset was up to date
    AssetSkipped {
        /// Registered name of the asset
        name: String,
    },
    /// An index file was written
    IndexGenerated {
        /// Path of the index file
        path: PathBuf,
    },
    /// Build process completed
    BuildCompleted {
        /// Total duration in milliseconds
        duration_ms: u64,
        /// Number of modules written
        generated: usize,
        /// Number of up-to-date assets
        skipped: usize,
        /// Number of index files written
        indexes: usize,
    },
    /// A warning was generated
    Warning {
        /// Asset that generated the warning (if applicable)
        asset: Option<PathBuf>,
        /// Warning message
        message: String,
    },
    /// An error occurred
    Error {
        /// Asset that generated the error (if applicable)
        asset: Option<PathBuf>,
        /// Error message
        message: String,
    },
}

/// Trait for progress reporters.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event.
    fn report(&self, event: ProgressEvent);

    /// Check if this reporter wants verbose output.
    fn is_verbose(&self) -> bool {
        false
    }
}

/// A progress reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    /// Create a new null progress reporter.
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Console progress reporter with optional colors.
pub struct ConsoleProgress {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show verbose output
    verbose: bool,
    /// Output writer (for testing)
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress")
            .field("use_colors", &self.use_colors)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl ConsoleProgress {
    /// Create a new console progress reporter writing to stderr.
    ///
    /// Colors are enabled when stderr is a terminal.
    pub fn new() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stderr),
            verbose: false,
            output: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Create a console progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { use_colors: false, verbose: false, output: Mutex::new(Box::new(output)) }
    }

    /// Set whether to use colors.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.color(text, "\x1b[32m")
    }

    fn yellow(&self, text: &str) -> String {
        self.color(text, "\x1b[33m")
    }

    fn red(&self, text: &str) -> String {
        self.color(text, "\x1b[31m")
    }

    fn cyan(&self, text: &str) -> String {
        self.color(text, "\x1b[36m")
    }

    fn bold(&self, text: &str) -> String {
        self.color(text, "\x1b[1m")
    }

    fn writeln(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", line);
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

fn with_asset(asset: Option<PathBuf>, message: &str) -> String {
    match asset {
        Some(path) => format!("{}: {}", path.display(), message),
        None => message.to_string(),
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::BuildStarted { total_assets, changed } => {
                if self.verbose {
                    self.writeln(&format!(
                        "{} {} asset{} found, {} changed",
                        self.cyan("[build]"),
                        total_assets,
                        if total_assets == 1 { "" } else { "s" },
                        changed
                    ));
                }
            }
            ProgressEvent::ModuleGenerated { name, duration_ms, .. } => {
                let mut line = self.yellow(&format!("Generated icon: {}", name));
                if self.verbose {
                    line.push_str(&format!(" ({})", format_duration(duration_ms)));
                }
                self.writeln(&line);
            }
            ProgressEvent::ModulePlanned { name, output } => {
                self.writeln(&format!(
                    "{} {} -> {}",
                    self.cyan("[dry-run]"),
                    name,
                    output.display()
                ));
            }
            ProgressEvent::AssetSkipped { name } => {
                if self.verbose {
                    self.writeln(&format!("{} {} (up to date)", self.cyan("[skip]"), name));
                }
            }
            ProgressEvent::IndexGenerated { path } => {
                self.writeln(&self.green(&format!("Generated {}", path.display())));
            }
            ProgressEvent::BuildCompleted { duration_ms, generated, skipped, indexes } => {
                if self.verbose || generated > 0 {
                    self.writeln(&format!(
                        "{} {} generated, {} skipped, {} {} in {}",
                        self.green("[done]"),
                        self.bold(&generated.to_string()),
                        skipped,
                        indexes,
                        if indexes == 1 { "index" } else { "indexes" },
                        format_duration(duration_ms)
                    ));
                }
            }
            ProgressEvent::Warning { asset, message } => {
                self.writeln(&format!("{} {}", self.yellow("[warn]"), with_asset(asset, &message)));
            }
            ProgressEvent::Error { asset, message } => {
                self.writeln(&format!("{} {}", self.red("[error]"), with_asset(asset, &message)));
            }
        }
    }

    fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// JSON progress reporter for machine-readable output.
///
/// Writes one JSON object per line.
pub struct JsonProgress {
    /// Output writer
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for JsonProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonProgress").finish()
    }
}

impl JsonProgress {
    /// Create a new JSON progress reporter writing to stderr.
    pub fn new() -> Self {
        Self { output: Mutex::new(Box::new(std::io::stderr())) }
    }

    /// Create a JSON progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { output: Mutex::new(Box::new(output)) }
    }

    fn write_json(&self, value: &Value) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", value);
        }
    }
}

impl Default for JsonProgress {
    fn default() -> Self {
        Self::new()
    }
}

fn event_json(event: ProgressEvent) -> Value {
    match event {
        ProgressEvent::BuildStarted { total_assets, changed } => {
            json!({ "event": "build_started", "total_assets": total_assets, "changed": changed })
        }
        ProgressEvent::ModuleGenerated { name, output, duration_ms } => json!({
            "event": "module_generated",
            "name": name,
            "output": output,
            "duration_ms": duration_ms,
        }),
        ProgressEvent::ModulePlanned { name, output } => {
            json!({ "event": "module_planned", "name": name, "output": output })
        }
        ProgressEvent::AssetSkipped { name } => json!({ "event": "asset_skipped", "name": name }),
        ProgressEvent::IndexGenerated { path } => {
            json!({ "event": "index_generated", "path": path })
        }
        ProgressEvent::BuildCompleted { duration_ms, generated, skipped, indexes } => json!({
            "event": "build_completed",
            "duration_ms": duration_ms,
            "generated": generated,
            "skipped": skipped,
            "indexes": indexes,
        }),
        ProgressEvent::Warning { asset, message } => {
            json!({ "event": "warning", "asset": asset, "message": message })
        }
        ProgressEvent::Error { asset, message } => {
            json!({ "event": "error", "asset": asset, "message": message })
        }
    }
}

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        self.write_json(&event_json(event));
    }
}

/// Format a duration in milliseconds to a human-readable string.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60_000;
        let seconds = (ms % 60_000) / 1000;
        format!("{}m {}s", minutes, seconds)
    }
}
