//! Watch mode for automatic rebuilds on file changes
//!
//! Provides file system watching with debouncing for the `svgbundle build --watch`
//! command. Every relevant change triggers a normal incremental build, so only
//! touched assets are regenerated.

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::Duration;

use crate::build::progress::{format_duration, ProgressReporter};
use crate::build::{BuildContext, BuildError, BuildPipeline, BuildResult};
use crate::config::schema::WatchConfig;

/// Error during watch mode
#[derive(Debug)]
pub enum WatchError {
    /// Failed to initialize file watcher
    WatcherInit(notify::Error),
    /// Failed to add watch path
    WatchPath(notify::Error),
    /// Channel receive error
    ChannelError(String),
    /// Source directory not found
    SourceNotFound(PathBuf),
}

impl std::fmt::Display for WatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchError::WatcherInit(e) => write!(f, "Failed to initialize file watcher: {}", e),
            WatchError::WatchPath(e) => write!(f, "Failed to watch path: {}", e),
            WatchError::ChannelError(msg) => write!(f, "Watch channel error: {}", msg),
            WatchError::SourceNotFound(path) => {
                write!(f, "Source directory not found: {}", path.display())
            }
        }
    }
}

impl std::error::Error for WatchError {}

/// Tracks the asset that failed the previous build, to report recoveries.
#[derive(Debug, Default)]
pub struct ErrorTracker {
    failing: HashSet<PathBuf>,
}

impl ErrorTracker {
    /// Create a new error tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Update tracker with a build outcome, returns assets that were fixed
    pub fn update(&mut self, outcome: &Result<BuildResult, BuildError>) -> Vec<PathBuf> {
        let current: HashSet<PathBuf> = match outcome {
            Err(BuildError::Asset { path, .. }) => HashSet::from([path.clone()]),
            _ => HashSet::new(),
        };

        let mut fixed: Vec<PathBuf> = self.failing.difference(&current).cloned().collect();
        fixed.sort();
        self.failing = current;
        fixed
    }

    /// Whether the last build had a failing asset
    pub fn has_errors(&self) -> bool {
        !self.failing.is_empty()
    }
}

/// Clear the terminal screen
fn clear_screen() {
    print!("\x1B[2J\x1B[1;1H");
}

/// Get current timestamp for logging
fn timestamp() -> String {
    use std::time::SystemTime;
    let now = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
    let secs = now.as_secs() % 86400;
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Whether a changed path should trigger a rebuild.
///
/// Source `.svg` files and the custom template count; anything inside the
/// output directory never does, since the build writes there itself.
fn is_relevant_change(path: &Path, out_dir: &Path, template: Option<&Path>) -> bool {
    if path.starts_with(out_dir) {
        return false;
    }
    if template.is_some_and(|t| t == path) {
        return true;
    }
    matches!(path.extension().and_then(|e| e.to_str()), Some("svg"))
}

/// Run one build pass with the given settings.
pub fn run_once(
    context: &BuildContext,
    force: bool,
    progress: Arc<dyn ProgressReporter>,
) -> Result<BuildResult, BuildError> {
    BuildPipeline::new(context.clone()).with_force(force).with_progress(progress).build()
}

/// Print a build outcome with fixed-asset notifications
fn print_build_outcome(outcome: &Result<BuildResult, BuildError>, fixed: &[PathBuf]) {
    for path in fixed {
        println!("[{}] Fixed: {}", timestamp(), path.display());
    }

    match outcome {
        Ok(result) => println!(
            "[{}] Build complete ({}) - Generated: {} | Skipped: {}",
            timestamp(),
            format_duration(result.total_duration.as_millis() as u64),
            result.generated_count(),
            result.skipped_count()
        ),
        Err(e) => eprintln!("[{}] Build failed: {}", timestamp(), e),
    }
}

/// Watch the source directory and rebuild on changes.
///
/// This function blocks and runs until interrupted (Ctrl+C). Build failures
/// are reported and watching continues.
pub fn watch_and_rebuild(
    context: BuildContext,
    config: WatchConfig,
    force: bool,
    progress: Arc<dyn ProgressReporter>,
) -> Result<(), WatchError> {
    let src_dir = context.src_dir();
    if !src_dir.is_dir() {
        return Err(WatchError::SourceNotFound(src_dir));
    }
    let out_dir = context.out_dir();
    let template = context.template_path();

    let (tx, rx) = channel();
    let debounce_duration = Duration::from_millis(config.debounce_ms as u64);
    let mut debouncer = new_debouncer(debounce_duration, tx).map_err(WatchError::WatcherInit)?;

    debouncer.watcher().watch(&src_dir, RecursiveMode::Recursive).map_err(WatchError::WatchPath)?;
    if let Some(template) = template.as_deref().filter(|t| !t.starts_with(&src_dir)) {
        debouncer
            .watcher()
            .watch(template, RecursiveMode::NonRecursive)
            .map_err(WatchError::WatchPath)?;
    }

    let mut error_tracker = ErrorTracker::new();

    if config.clear_screen {
        clear_screen();
    }
    println!("[{}] Building...", timestamp());
    let outcome = run_once(&context, force, Arc::clone(&progress));
    let fixed = error_tracker.update(&outcome);
    print_build_outcome(&outcome, &fixed);
    println!("[{}] Watching {} for changes...", timestamp(), src_dir.display());

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant: Vec<_> = events
                    .iter()
                    .filter(|e| {
                        matches!(e.kind, DebouncedEventKind::Any)
                            && is_relevant_change(&e.path, &out_dir, template.as_deref())
                    })
                    .collect();

                if relevant.is_empty() {
                    continue;
                }

                if config.clear_screen {
                    clear_screen();
                }
                for event in &relevant {
                    if let Some(name) = event.path.file_name() {
                        println!("[{}] Changed: {}", timestamp(), name.to_string_lossy());
                    }
                }

                println!("[{}] Building...", timestamp());
                let outcome = run_once(&context, force, Arc::clone(&progress));
                let fixed = error_tracker.update(&outcome);
                print_build_outcome(&outcome, &fixed);
                println!("[{}] Watching {} for changes...", timestamp(), src_dir.display());
            }
            Ok(Err(error)) => {
                eprintln!("[{}] Watch error: {:?}", timestamp(), error);
                eprintln!("[{}] Continuing to watch...", timestamp());
            }
            Err(e) => {
                return Err(WatchError::ChannelError(e.to_string()));
            }
        }
    }
}
