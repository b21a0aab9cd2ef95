//! Build command implementation

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::build::progress::{ConsoleProgress, JsonProgress, ProgressReporter};
use crate::build::{BuildContext, BuildPipeline, IncrementalStats};
use crate::config::loader::{
    default_config, find_config, load_config, merge_cli_overrides, project_root, CliOverrides,
};
use crate::config::{ConfigError, SvgBundleConfig};

/// Arguments of the build command.
#[derive(Debug, Default, Clone)]
pub struct BuildArgs {
    pub config: Option<PathBuf>,
    pub src: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub ext: Option<String>,
    pub template: Option<PathBuf>,
    pub rename_styles: bool,
    pub force: bool,
    pub dry_run: bool,
    pub watch: bool,
    pub jobs: Option<usize>,
    pub json: bool,
    pub verbose: bool,
}

/// Paths given on the command line are relative to the working directory,
/// not the project root.
fn from_cwd(path: &Path, cwd: &Path) -> PathBuf {
    crate::config::loader::resolve_path(cwd, path)
}

/// Load the config file and return it with its project root.
fn resolve_config(args: &BuildArgs, cwd: &Path) -> Result<(SvgBundleConfig, PathBuf), ConfigError> {
    let config_path = match &args.config {
        Some(path) => Some(from_cwd(path, cwd)),
        None => find_config(),
    };

    match config_path {
        Some(path) => {
            if args.verbose && !args.json {
                eprintln!("Using config: {}", path.display());
            }
            let config = load_config(Some(&path))?;
            let root = project_root(&path)
                .map(Path::to_path_buf)
                .unwrap_or_else(|| cwd.to_path_buf());
            Ok((config, root))
        }
        None => {
            if args.verbose && !args.json {
                eprintln!("No svgbundle.toml found, using defaults");
            }
            Ok((default_config(), cwd.to_path_buf()))
        }
    }
}

/// Run the build command
pub fn run_build(args: BuildArgs) -> ExitCode {
    ExitCode::from(execute_build(args))
}

/// Run the build command and return the numeric exit code.
fn execute_build(args: BuildArgs) -> u8 {
    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("Error: cannot determine working directory: {}", e);
            return EXIT_ERROR;
        }
    };

    let (mut config, root) = match resolve_config(&args, &cwd) {
        Ok(found) => found,
        Err(e @ ConfigError::Validation(_)) => {
            eprintln!("{}", e);
            return EXIT_INVALID_ARGS;
        }
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return EXIT_ERROR;
        }
    };

    let overrides = CliOverrides {
        src: args.src.as_deref().map(|p| from_cwd(p, &cwd)),
        out: args.out.as_deref().map(|p| from_cwd(p, &cwd)),
        ext: args.ext.clone(),
        template: args.template.as_deref().map(|p| from_cwd(p, &cwd)),
        rename_styles: args.rename_styles.then_some(true),
        jobs: args.jobs,
    };
    merge_cli_overrides(&mut config, &overrides);

    let errors = config.validate();
    if !errors.is_empty() {
        for error in errors {
            eprintln!("Error: {}", error);
        }
        return EXIT_INVALID_ARGS;
    }

    let progress: Arc<dyn ProgressReporter> = if args.json {
        Arc::new(JsonProgress::new())
    } else {
        Arc::new(ConsoleProgress::new().with_verbose(args.verbose))
    };

    let watch_config = config.watch.clone();
    let context = BuildContext::new(config.build, root).with_verbose(args.verbose);

    if args.watch && !args.dry_run {
        println!("Starting watch mode...");
        println!("Press Ctrl+C to stop");
        println!();

        return match crate::watch::watch_and_rebuild(context, watch_config, args.force, progress) {
            Ok(()) => EXIT_SUCCESS,
            Err(e) => {
                eprintln!("Watch error: {}", e);
                EXIT_ERROR
            }
        };
    }

    let pipeline = BuildPipeline::new(context)
        .with_force(args.force)
        .with_dry_run(args.dry_run)
        .with_progress(progress);

    match pipeline.build() {
        Ok(result) => {
            if !args.json {
                let stats = IncrementalStats::from_result(&result);
                if args.verbose || stats.had_rebuilds() || args.dry_run {
                    println!("{}", result.summary());
                }
                if args.verbose && !args.dry_run {
                    println!("Incremental: {}", stats);
                }
            }
            EXIT_SUCCESS
        }
        Err(e) => {
            if !args.json {
                eprintln!("Build error: {}", e);
            }
            EXIT_ERROR
        }
    }
}
