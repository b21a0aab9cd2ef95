//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod build;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

pub use build::BuildArgs;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// svgbundle - Compile SVG files into self-registering icon modules
#[derive(Parser)]
#[command(name = "svgbundle")]
#[command(about = "Compile SVG files into self-registering icon modules with barrel indexes")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate modules and index files from the source directory
    Build {
        /// Config file (default: nearest svgbundle.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override source directory
        #[arg(long)]
        src: Option<PathBuf>,

        /// Override output directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Override output file extension
        #[arg(long)]
        ext: Option<String>,

        /// Override the module template
        #[arg(long)]
        template: Option<PathBuf>,

        /// Rename fill/stroke attributes on drawable elements
        #[arg(long)]
        rename_styles: bool,

        /// Force rebuild all assets (ignore timestamps)
        #[arg(short, long)]
        force: bool,

        /// Dry run (show what would be built without writing)
        #[arg(long)]
        dry_run: bool,

        /// Watch for changes and rebuild automatically
        #[arg(short, long)]
        watch: bool,

        /// Number of parallel workers
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
        jobs: Option<u16>,

        /// Emit progress as JSON lines
        #[arg(long)]
        json: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Parse arguments and run the selected command.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            config,
            src,
            out,
            ext,
            template,
            rename_styles,
            force,
            dry_run,
            watch,
            jobs,
            json,
            verbose,
        } => build::run_build(BuildArgs {
            config,
            src,
            out,
            ext,
            template,
            rename_styles,
            force,
            dry_run,
            watch,
            jobs: jobs.map(usize::from),
            json,
            verbose,
        }),
    }
}
