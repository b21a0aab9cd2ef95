//! Barrel index generation.
//!
//! After the modules are written, one `index.<ext>` is emitted per output
//! directory. Each index imports the indexes of its immediate child
//! directories, then every module residing directly in it, so importing the
//! root index pulls in the whole bundle.

use crate::build::asset::SourceAsset;
use crate::build::progress::{ProgressEvent, ProgressReporter};
use crate::build::{BuildContext, BuildError};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Base name of generated index files.
pub const INDEX_NAME: &str = "index";

/// Directory tree of assets, built once per build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirTree {
    children: BTreeMap<String, DirTree>,
    leaves: BTreeSet<String>,
}

impl DirTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from every asset's relative directory and name.
    pub fn from_assets<'a, I>(assets: I) -> Self
    where
        I: IntoIterator<Item = &'a SourceAsset>,
    {
        let mut tree = Self::new();
        for asset in assets {
            tree.insert(asset.relative_dir.segments(), &asset.name);
        }
        tree
    }

    /// Insert a leaf below the given directory segments.
    pub fn insert(&mut self, segments: &[String], name: &str) {
        let mut node = self;
        for segment in segments {
            node = node.children.entry(segment.clone()).or_default();
        }
        node.leaves.insert(name.to_string());
    }

    /// Child directories, sorted by name.
    pub fn children(&self) -> impl Iterator<Item = (&str, &DirTree)> {
        self.children.iter().map(|(name, child)| (name.as_str(), child))
    }

    /// Leaf names residing directly in this directory, sorted.
    pub fn leaves(&self) -> impl Iterator<Item = &str> {
        self.leaves.iter().map(String::as_str)
    }

    /// Whether the tree holds no assets at all.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty() && self.children.is_empty()
    }

    /// Visit every node depth-first, parents before children.
    ///
    /// The callback receives the node's segments relative to the root.
    pub fn walk<F, E>(&self, mut visit: F) -> Result<(), E>
    where
        F: FnMut(&[String], &DirTree) -> Result<(), E>,
    {
        let mut path = Vec::new();
        self.walk_inner(&mut path, &mut visit)
    }

    fn walk_inner<F, E>(&self, path: &mut Vec<String>, visit: &mut F) -> Result<(), E>
    where
        F: FnMut(&[String], &DirTree) -> Result<(), E>,
    {
        visit(path, self)?;
        for (name, child) in &self.children {
            path.push(name.clone());
            child.walk_inner(path, visit)?;
            path.pop();
        }
        Ok(())
    }
}

/// How import statements inside an index are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStyle {
    /// `import '<p>'` when true, `require('<p>')` otherwise
    pub es6: bool,
    /// Suffix appended to import specifiers (`.js` or empty)
    pub suffix: String,
    /// Optional first line (lint-disable comment)
    pub header: Option<String>,
}

impl IndexStyle {
    /// Derive the style from build settings.
    ///
    /// Only `js` output gets an explicit suffix; other extensions rely on the
    /// consumer's resolver.
    pub fn new(ext: &str, es6: bool, header: Option<&str>) -> Self {
        let suffix = if ext == "js" { ".js".to_string() } else { String::new() };
        Self { es6, suffix, header: header.map(str::to_string) }
    }

    /// Derive the style from a build context.
    pub fn from_context(ctx: &BuildContext) -> Self {
        let options = ctx.options();
        Self::new(&options.ext, options.es6, options.lint_header())
    }

    /// One import statement for a specifier.
    pub fn statement(&self, specifier: &str) -> String {
        if self.es6 {
            format!("import '{}'", specifier)
        } else {
            format!("require('{}')", specifier)
        }
    }

    /// Full content of the index for one node.
    pub fn render(&self, node: &DirTree) -> String {
        let mut out = String::new();
        if let Some(header) = &self.header {
            out.push_str(header);
            out.push('\n');
        }
        for (dir, _) in node.children() {
            out.push_str(&self.statement(&format!("./{}/{}{}", dir, INDEX_NAME, self.suffix)));
            out.push('\n');
        }
        for leaf in node.leaves() {
            out.push_str(&self.statement(&format!("./{}{}", leaf, self.suffix)));
            out.push('\n');
        }
        out
    }
}

/// Write `content` to `path` unless the file already holds exactly that.
///
/// Returns whether the file was written.
fn write_if_changed(path: &Path, content: &str) -> std::io::Result<bool> {
    if let Ok(existing) = fs::read_to_string(path) {
        if existing == content {
            return Ok(false);
        }
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(true)
}

/// Generate index files for every directory holding assets.
///
/// Works from the full discovered asset set, not just the assets rebuilt in
/// this run. Returns the paths of index files actually written.
pub fn generate_indexes(
    ctx: &BuildContext,
    assets: &[SourceAsset],
    progress: &dyn ProgressReporter,
) -> Result<Vec<PathBuf>, BuildError> {
    let (shadowed, indexed): (Vec<&SourceAsset>, Vec<&SourceAsset>) =
        assets.iter().partition(|asset| asset.name == INDEX_NAME);
    for asset in shadowed {
        progress.report(ProgressEvent::Warning {
            asset: Some(asset.path.clone()),
            message: format!(
                "module '{}' is shadowed by the generated index",
                asset.registered_name()
            ),
        });
    }

    let tree = DirTree::from_assets(indexed);

    if tree.is_empty() {
        return Ok(Vec::new());
    }

    let out_dir = ctx.out_dir();
    let style = IndexStyle::from_context(ctx);
    let file_name = format!("{}.{}", INDEX_NAME, ctx.options().ext);
    let mut written = Vec::new();

    tree.walk(|segments, node| -> Result<(), BuildError> {
        let mut path = out_dir.clone();
        path.extend(segments);
        path.push(&file_name);

        let changed = write_if_changed(&path, &style.render(node))
            .map_err(|source| BuildError::Index { path: path.clone(), source })?;
        if changed {
            let shown = path.strip_prefix(ctx.project_root()).unwrap_or(&path).to_path_buf();
            progress.report(ProgressEvent::IndexGenerated { path: shown });
            written.push(path);
        }
        Ok(())
    })?;

    Ok(written)
}
