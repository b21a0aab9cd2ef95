//! Source assets and the canonical relative-path derivation.
//!
//! Both module output paths and index generation go through
//! [`relative_dir`], so the two always agree on where an asset lives.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Directory of an asset relative to the source root, as path segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativeDir {
    segments: Vec<String>,
}

impl RelativeDir {
    /// The source root itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build from individual segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { segments: segments.into_iter().map(Into::into).collect() }
    }

    /// Path segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this is the source root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// `/`-separated form with a trailing separator (`"ui/arrows/"`), or `""`
    /// for the root. This is the prefix used in registered names and ids.
    pub fn as_prefix(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push_str(segment);
            out.push('/');
        }
        out
    }

    /// Join onto a base directory.
    pub fn join_onto(&self, base: &Path) -> PathBuf {
        let mut path = base.to_path_buf();
        path.extend(&self.segments);
        path
    }
}

impl fmt::Display for RelativeDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_prefix())
    }
}

/// Normal path components as strings, skipping `.` and roots.
fn normal_segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Derive an asset's directory relative to the source root.
///
/// Strips `source_root` and the file name, then a leading `sub_dir` if the
/// remainder starts with it. Returns `None` when `file` is not under
/// `source_root`.
pub fn relative_dir(
    source_root: &Path,
    file: &Path,
    sub_dir: Option<&Path>,
) -> Option<RelativeDir> {
    let parent = file.parent().unwrap_or(Path::new(""));
    let rel = parent.strip_prefix(source_root).ok()?;
    let mut segments = normal_segments(rel);

    if let Some(sub_dir) = sub_dir {
        let prefix = normal_segments(sub_dir);
        if !prefix.is_empty() && segments.starts_with(&prefix) {
            segments.drain(..prefix.len());
        }
    }

    Some(RelativeDir { segments })
}

/// File name without its final extension.
pub fn asset_name(file: &Path) -> Option<String> {
    file.file_stem().map(|s| s.to_string_lossy().into_owned())
}

/// Modification time in milliseconds since the Unix epoch, keeping
/// sub-millisecond precision.
pub fn modified_millis(path: &Path) -> std::io::Result<f64> {
    let modified = fs::metadata(path)?.modified()?;
    let since_epoch = modified.duration_since(UNIX_EPOCH).map_err(std::io::Error::other)?;
    Ok(since_epoch.as_nanos() as f64 / 1_000_000.0)
}

/// One discovered source file. Immutable for the duration of a build.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceAsset {
    /// Absolute path of the `.svg` file
    pub path: PathBuf,
    /// File name without extension
    pub name: String,
    /// Directory relative to the source root
    pub relative_dir: RelativeDir,
    /// Modification time in milliseconds
    pub modified_at: f64,
}

impl SourceAsset {
    /// Name the module registers under: relative directory plus name.
    pub fn registered_name(&self) -> String {
        format!("{}{}", self.relative_dir.as_prefix(), self.name)
    }

    /// Where the generated module for this asset is written.
    pub fn output_path(&self, target_root: &Path, ext: &str) -> PathBuf {
        self.relative_dir.join_onto(target_root).join(format!("{}.{}", self.name, ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relative_dir_nested() {
        let dir = relative_dir(Path::new("/p/icons"), Path::new("/p/icons/sub/icon.svg"), None);
        assert_eq!(dir, Some(RelativeDir::from_segments(["sub"])));
        assert_eq!(dir.unwrap().as_prefix(), "sub/");
    }

    #[test]
    fn test_relative_dir_root() {
        let dir =
            relative_dir(Path::new("/p/icons"), Path::new("/p/icons/icon.svg"), None).unwrap();
        assert!(dir.is_root());
        assert_eq!(dir.as_prefix(), "");
    }

    #[test]
    fn test_relative_dir_strips_sub_dir() {
        let dir = relative_dir(
            Path::new("/p/assets"),
            Path::new("/p/assets/svg/ui/arrow.svg"),
            Some(Path::new("./svg")),
        )
        .unwrap();
        assert_eq!(dir.as_prefix(), "ui/");
    }

    #[test]
    fn test_relative_dir_sub_dir_only_leading() {
        let dir = relative_dir(
            Path::new("/p/assets"),
            Path::new("/p/assets/ui/svg/arrow.svg"),
            Some(Path::new("svg")),
        )
        .unwrap();
        assert_eq!(dir.as_prefix(), "ui/svg/");
    }

    #[test]
    fn test_relative_dir_unmatched_sub_dir_is_noop() {
        let dir = relative_dir(
            Path::new("/p/assets/svg"),
            Path::new("/p/assets/svg/sub/icon.svg"),
            Some(Path::new("assets/svg")),
        )
        .unwrap();
        assert_eq!(dir.as_prefix(), "sub/");
    }

    #[test]
    fn test_relative_dir_outside_root() {
        assert_eq!(relative_dir(Path::new("/p/icons"), Path::new("/q/icon.svg"), None), None);
    }

    #[test]
    fn test_asset_name() {
        assert_eq!(asset_name(Path::new("/a/star.svg")), Some("star".to_string()));
        assert_eq!(asset_name(Path::new("/a/star.filled.svg")), Some("star.filled".to_string()));
    }

    #[test]
    fn test_output_path_and_registered_name() {
        let asset = SourceAsset {
            path: PathBuf::from("/p/icons/sub/icon.svg"),
            name: "icon".to_string(),
            relative_dir: RelativeDir::from_segments(["sub"]),
            modified_at: 1.0,
        };
        assert_eq!(
            asset.output_path(Path::new("/p/out"), "js"),
            PathBuf::from("/p/out/sub/icon.js")
        );
        assert_eq!(asset.registered_name(), "sub/icon");
    }

    #[test]
    fn test_modified_millis_matches_metadata() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.svg");
        fs::write(&file, "<svg/>").unwrap();

        let first = modified_millis(&file).unwrap();
        let second = modified_millis(&file).unwrap();
        assert!(first > 0.0);
        assert_eq!(first, second);
    }
}
