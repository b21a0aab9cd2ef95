//! Build pipeline orchestration.
//!
//! One build pass: resolve the template and optimizer, discover assets,
//! filter them through change detection, transform every changed asset on a
//! worker pool, wait for all of them to settle, then regenerate the index
//! files from the full asset set.

use crate::build::asset::SourceAsset;
use crate::build::discovery::{discover_assets, DiscoveryError};
use crate::build::incremental::{metadata_header, ChangeDetector};
use crate::build::index::generate_indexes;
use crate::build::progress::{NullProgress, ProgressEvent, ProgressReporter};
use crate::build::{AssetResult, BuildContext, BuildResult};
use crate::markup::{escape_single_quoted, rename_styles, strip_svg_wrapper};
use crate::markup::{namespace_key, IdNamespacer};
use crate::optimizer::{load_optimizer, optimize_asset, MarkupOptimizer, OptimizeError};
use crate::templates::{compile, default_template, TemplateFields};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Failure while transforming or writing one asset.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The source file could not be read
    #[error("failed to read source: {0}")]
    Read(#[source] std::io::Error),
    /// The optimizer rejected the markup
    #[error("optimization failed: {0}")]
    Optimize(#[from] OptimizeError),
    /// The generated module could not be written
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Output path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

/// Error during build execution.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The custom template could not be read
    #[error("failed to read template {}: {source}", path.display())]
    Template {
        /// Template path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
    /// The optimizer could not be configured
    #[error("optimizer setup failed: {0}")]
    Optimizer(#[from] OptimizeError),
    /// Discovery error
    #[error("discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),
    /// The id prefix cannot be turned into a pattern
    #[error("invalid id prefix: {0}")]
    IdPattern(#[from] regex::Error),
    /// Two assets would produce the same namespaced ids
    #[error(
        "{} and {} both map to namespace '{key}'",
        first.display(),
        second.display()
    )]
    NamespaceCollision {
        /// Colliding namespace key
        key: String,
        /// First asset with this key
        first: PathBuf,
        /// Second asset with this key
        second: PathBuf,
    },
    /// A single asset failed
    #[error("{}: {source}", path.display())]
    Asset {
        /// Source asset path
        path: PathBuf,
        /// What went wrong
        #[source]
        source: AssetError,
    },
    /// An index file could not be written
    #[error("failed to write index {}: {source}", path.display())]
    Index {
        /// Index path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
    /// The worker pool could not be started
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns one source asset into module text.
///
/// Holds only read-only state, so one instance is shared by every worker.
pub struct AssetCompiler<'a> {
    template: &'a str,
    optimizer: &'a dyn MarkupOptimizer,
    namespacer: IdNamespacer,
    rename_styles: bool,
}

impl<'a> AssetCompiler<'a> {
    /// Create a compiler.
    pub fn new(
        template: &'a str,
        optimizer: &'a dyn MarkupOptimizer,
        namespacer: IdNamespacer,
        rename_styles: bool,
    ) -> Self {
        Self { template, optimizer, namespacer, rename_styles }
    }

    /// Transform markup into the full module text, header included.
    pub fn compile_markup(&self, asset: &SourceAsset, markup: &str) -> Result<String, AssetError> {
        let optimized = optimize_asset(self.optimizer, markup)?;

        let mut data = strip_svg_wrapper(&optimized.data);
        if self.rename_styles {
            data = rename_styles(&data);
        }
        let data = self.namespacer.namespace(&data, &asset.relative_dir.as_prefix(), &asset.name);

        let fields = TemplateFields::new()
            .set("name", asset.registered_name())
            .set("width", optimized.width)
            .set("height", optimized.height)
            .set("viewBox", format!("'{}'", optimized.view_box))
            .set("data", escape_single_quoted(&data))
            .set("lastMod", asset.modified_at);

        Ok(format!("{}\n{}", metadata_header(asset.modified_at), compile(self.template, &fields)))
    }

    /// Read, transform and write one asset.
    pub fn build_asset(&self, asset: &SourceAsset, output: &Path) -> Result<(), AssetError> {
        let markup = fs::read_to_string(&asset.path).map_err(AssetError::Read)?;
        let module = self.compile_markup(asset, &markup)?;

        let write_error = |source| AssetError::Write { path: output.to_path_buf(), source };
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(output, module).map_err(write_error)
    }
}

/// Reject asset sets where two assets using reserved ids would share a
/// namespace key.
///
/// Assets without reserved ids cannot clash, so only those are read.
pub fn check_namespace_collisions(
    assets: &[SourceAsset],
    namespacer: &IdNamespacer,
) -> Result<(), BuildError> {
    let key_of = |asset: &SourceAsset| {
        namespace_key(
            &asset.relative_dir.as_prefix(),
            &asset.name,
            namespacer.separator(),
        )
    };

    let mut counts: HashMap<String, usize> = HashMap::new();
    for asset in assets {
        *counts.entry(key_of(asset)).or_default() += 1;
    }

    let mut seen: HashMap<String, &Path> = HashMap::new();
    for asset in assets {
        let key = key_of(asset);
        if counts.get(&key).copied().unwrap_or(0) < 2 {
            continue;
        }
        // Unreadable sources fail later with their own asset error.
        let uses_ids = fs::read_to_string(&asset.path)
            .map(|markup| namespacer.matches(&markup))
            .unwrap_or(false);
        if !uses_ids {
            continue;
        }
        if let Some(first) = seen.get(&key) {
            return Err(BuildError::NamespaceCollision {
                key,
                first: first.to_path_buf(),
                second: asset.path.clone(),
            });
        }
        seen.insert(key, &asset.path);
    }
    Ok(())
}

/// Build pipeline for executing builds.
pub struct BuildPipeline {
    /// Build context
    context: BuildContext,
    /// Whether to rebuild every asset regardless of change detection
    force: bool,
    /// Whether to do a dry run (don't write anything)
    dry_run: bool,
    /// Where progress events go
    progress: Arc<dyn ProgressReporter>,
}

impl BuildPipeline {
    /// Create a new build pipeline.
    pub fn new(context: BuildContext) -> Self {
        Self { context, force: false, dry_run: false, progress: Arc::new(NullProgress) }
    }

    /// Set force mode (rebuild everything).
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Set dry-run mode (don't actually build).
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the progress reporter.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// The build context.
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Template text: the configured file, or the bundled default.
    fn load_template(&self) -> Result<String, BuildError> {
        match self.context.template_path() {
            Some(path) => {
                fs::read_to_string(&path).map_err(|source| BuildError::Template { path, source })
            }
            None => Ok(default_template(self.context.options().es6).to_string()),
        }
    }

    /// Run the build pipeline.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let options = self.context.options();
        let progress = self.progress.as_ref();

        let template = self.load_template()?;
        let cwd = std::env::current_dir()?;
        let optimizer = load_optimizer(options.optimizer.as_ref(), &cwd)?;
        let namespacer = IdNamespacer::new(&options.id_prefix, &options.id_separator)?;

        let assets = discover_assets(&self.context)?;
        check_namespace_collisions(&assets, &namespacer)?;

        let out_dir = self.context.out_dir();
        let detector = ChangeDetector::new(&self.context).with_force(self.force);
        let changed: Vec<bool> = assets.iter().map(|a| detector.needs_rebuild(a)).collect();

        progress.report(ProgressEvent::BuildStarted {
            total_assets: assets.len(),
            changed: changed.iter().filter(|c| **c).count(),
        });

        let mut result = BuildResult::new();

        if self.dry_run {
            for (asset, changed) in assets.iter().zip(&changed) {
                let output = asset.output_path(&out_dir, &options.ext);
                if *changed {
                    progress.report(ProgressEvent::ModulePlanned {
                        name: asset.registered_name(),
                        output: output.clone(),
                    });
                    result.add_result(AssetResult::planned(asset.registered_name(), output));
                } else {
                    result.add_result(AssetResult::skipped(asset.registered_name(), output));
                }
            }
            return Ok(result.with_duration(start.elapsed()));
        }

        let compiler =
            AssetCompiler::new(&template, optimizer.as_ref(), namespacer, options.rename_styles);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(self.context.jobs()).build()?;

        // Every unit settles before anything else happens.
        let outcomes: Vec<Result<AssetResult, AssetError>> = pool.install(|| {
            assets
                .par_iter()
                .zip(changed.par_iter())
                .map(|(asset, changed)| {
                    let name = asset.registered_name();
                    let output = asset.output_path(&out_dir, &options.ext);
                    if !*changed {
                        progress.report(ProgressEvent::AssetSkipped { name: name.clone() });
                        return Ok(AssetResult::skipped(name, output));
                    }

                    let unit_start = Instant::now();
                    compiler.build_asset(asset, &output)?;
                    let duration = unit_start.elapsed();
                    progress.report(ProgressEvent::ModuleGenerated {
                        name: name.clone(),
                        output: output.clone(),
                        duration_ms: duration.as_millis() as u64,
                    });
                    Ok(AssetResult::generated(name, output, duration))
                })
                .collect()
        });

        let mut failures = Vec::new();
        for (asset, outcome) in assets.iter().zip(outcomes) {
            match outcome {
                Ok(asset_result) => result.add_result(asset_result),
                Err(err) => {
                    progress.report(ProgressEvent::Error {
                        asset: Some(asset.path.clone()),
                        message: err.to_string(),
                    });
                    failures.push((asset.path.clone(), err));
                }
            }
        }
        if let Some((path, source)) = failures.into_iter().next() {
            return Err(BuildError::Asset { path, source });
        }

        result.indexes = generate_indexes(&self.context, &assets, progress)?;
        result.total_duration = start.elapsed();

        progress.report(ProgressEvent::BuildCompleted {
            duration_ms: result.total_duration.as_millis() as u64,
            generated: result.generated_count(),
            skipped: result.skipped_count(),
            indexes: result.indexes.len(),
        });

        Ok(result)
    }
}
