//! Build System Test Suite
//!
//! Integration tests for the svgbundle build system.
//! Tests cover the full build pipeline including:
//!
//! - End-to-end module generation
//! - Incremental builds (timestamp header round trip)
//! - Identifier namespacing across directories
//! - Index generation over nested trees
//! - Optimizer configuration (inline and file based)
//! - Progress reporting

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use svgbundle::build::progress::{ConsoleProgress, JsonProgress, ProgressReporter};
use svgbundle::build::{
    read_embedded_timestamp, AssetStatus, BuildContext, BuildError, BuildPipeline, IncrementalStats,
};
use svgbundle::config::{BuildOptions, OptimizerConfig};
use svgbundle::optimizer::OptimizerSettings;

// ============================================================================
// Test Utilities
// ============================================================================

const STAR: &str = r#"<svg width="24" height="24"><path id="svgiconFill" fill="red" d="M1 1h22v22H1z"/></svg>"#;

/// Create a test file with content.
fn create_test_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut file = File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

/// Build options pointing at `icons/` and `out/`.
fn test_options() -> BuildOptions {
    BuildOptions {
        source_path: PathBuf::from("icons"),
        target_path: PathBuf::from("out"),
        ext: "js".to_string(),
        ..Default::default()
    }
}

fn run(root: &Path, options: BuildOptions) -> Result<svgbundle::build::BuildResult, BuildError> {
    BuildPipeline::new(BuildContext::new(options, root.to_path_buf())).build()
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

/// Test writer for capturing output.
struct TestWriter(Arc<Mutex<Vec<u8>>>);

impl Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Pipeline Integration Tests
// ============================================================================

#[test]
fn test_star_end_to_end() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "icons/star.svg", STAR);

    let options = BuildOptions { rename_styles: true, ..test_options() };
    let result = run(temp.path(), options).unwrap();
    assert_eq!(result.generated_count(), 1);

    let module = read(temp.path(), "out/star.js");
    assert!(module.contains("width: 24"));
    assert!(module.contains("height: 24"));
    assert!(module.contains("viewBox: '0 0 24 24'"));
    assert!(module.contains("svgicon_star_Fill"));
    assert!(module.contains(r#"_fill="red""#));
    assert!(!module.contains(r#" fill="red""#));
}

#[test]
fn test_nested_tree_generates_modules_and_indexes() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "icons/star.svg", STAR);
    create_test_file(temp.path(), "icons/ui/arrow.svg", STAR);
    create_test_file(temp.path(), "icons/ui/nav/menu.svg", STAR);
    create_test_file(temp.path(), "icons/ui/notes.txt", "ignored");

    let result = run(temp.path(), test_options()).unwrap();
    assert_eq!(result.generated_count(), 3);
    assert_eq!(result.indexes.len(), 3);

    assert!(read(temp.path(), "out/ui/nav/menu.js").contains("'ui/nav/menu': {"));
    assert!(read(temp.path(), "out/ui/arrow.js").contains("svgicon_ui_arrow_Fill"));

    assert_eq!(
        read(temp.path(), "out/index.js"),
        "/* eslint-disable */\nimport './ui/index.js'\nimport './star.js'\n"
    );
    assert_eq!(
        read(temp.path(), "out/ui/index.js"),
        "/* eslint-disable */\nimport './nav/index.js'\nimport './arrow.js'\n"
    );
    assert_eq!(
        read(temp.path(), "out/ui/nav/index.js"),
        "/* eslint-disable */\nimport './menu.js'\n"
    );
}

#[test]
fn test_commonjs_typescript_output() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "icons/star.svg", STAR);

    let options = BuildOptions { ext: "ts".to_string(), es6: false, ..test_options() };
    run(temp.path(), options).unwrap();

    let module = read(temp.path(), "out/star.ts");
    assert!(module.contains("var icon = require('vue-svgicon')"));
    assert_eq!(read(temp.path(), "out/index.ts"), "/* tslint:disable */\nrequire('./star')\n");
}

#[test]
fn test_sub_dir_is_stripped_from_relative_paths() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "assets/svg/ui/arrow.svg", STAR);

    let options = BuildOptions {
        source_path: PathBuf::from("assets"),
        sub_dir: Some(PathBuf::from("svg")),
        ..test_options()
    };
    run(temp.path(), options).unwrap();

    assert!(read(temp.path(), "out/ui/arrow.js").contains("'ui/arrow': {"));
    assert!(temp.path().join("out/ui/index.js").exists());
}

#[test]
fn test_index_completeness_sibling_directories() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "icons/a/x.svg", STAR);
    create_test_file(temp.path(), "icons/a/y.svg", STAR);
    create_test_file(temp.path(), "icons/b/z.svg", STAR);

    let result = run(temp.path(), test_options()).unwrap();
    assert_eq!(result.generated_count(), 3);
    assert_eq!(result.indexes.len(), 3);

    let root = read(temp.path(), "out/index.js");
    let root_imports: Vec<&str> = root.lines().filter(|l| l.starts_with("import")).collect();
    assert_eq!(root_imports, vec!["import './a/index.js'", "import './b/index.js'"]);

    let a = read(temp.path(), "out/a/index.js");
    let a_imports: Vec<&str> = a.lines().filter(|l| l.starts_with("import")).collect();
    assert_eq!(a_imports, vec!["import './x.js'", "import './y.js'"]);

    let b = read(temp.path(), "out/b/index.js");
    let b_imports: Vec<&str> = b.lines().filter(|l| l.starts_with("import")).collect();
    assert_eq!(b_imports, vec!["import './z.js'"]);
}

#[test]
fn test_view_box_fallbacks() {
    let temp = TempDir::new().unwrap();
    create_test_file(
        temp.path(),
        "icons/explicit.svg",
        r#"<svg width="10" height="10" viewBox="0 0 48 48"><rect/></svg>"#,
    );
    create_test_file(temp.path(), "icons/sized.svg", r#"<svg width="12" height="8"><rect/></svg>"#);
    create_test_file(temp.path(), "icons/bare.svg", r#"<svg><rect/></svg>"#);

    run(temp.path(), test_options()).unwrap();

    assert!(read(temp.path(), "out/explicit.js").contains("viewBox: '0 0 48 48'"));
    assert!(read(temp.path(), "out/sized.js").contains("viewBox: '0 0 12 8'"));
    let bare = read(temp.path(), "out/bare.js");
    assert!(bare.contains("viewBox: '0 0 200 200'"));
    assert!(bare.contains("width: 16"));
    assert!(bare.contains("height: 16"));
}

#[test]
fn test_single_quoted_attributes() {
    let temp = TempDir::new().unwrap();
    create_test_file(
        temp.path(),
        "icons/q.svg",
        "<svg viewBox='0 0 48 48' width='24' height='24'><path fill='red' d='M0 0'/></svg>",
    );

    let options = BuildOptions { rename_styles: true, ..test_options() };
    run(temp.path(), options).unwrap();

    let module = read(temp.path(), "out/q.js");
    assert!(module.contains("viewBox: '0 0 48 48'"));
    assert!(module.contains("width: 24"));
    assert!(module.contains(r#"<path _fill="red" d="M0 0"/>"#));
}

#[test]
fn test_markup_is_escaped_for_single_quotes() {
    let temp = TempDir::new().unwrap();
    create_test_file(
        temp.path(),
        "icons/quote.svg",
        "<svg width=\"4\" height=\"4\"><text font-family=\"'Open Sans'\">a\\b</text></svg>",
    );

    run(temp.path(), test_options()).unwrap();
    let module = read(temp.path(), "out/quote.js");
    assert!(module.contains(r#"font-family="\'Open Sans\'""#));
    assert!(module.contains(r"a\\b"));
}

#[test]
fn test_namespace_collision_fails_build() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "icons/a/b/x.svg", STAR);
    create_test_file(temp.path(), "icons/a_b/x.svg", STAR);

    let err = run(temp.path(), test_options()).unwrap_err();
    assert!(matches!(err, BuildError::NamespaceCollision { .. }));
    assert!(!temp.path().join("out").exists());

    let options = BuildOptions { id_separator: "-".to_string(), ..test_options() };
    assert_eq!(run(temp.path(), options).unwrap().generated_count(), 2);
}

#[test]
fn test_shared_namespace_key_without_reserved_ids_builds() {
    let temp = TempDir::new().unwrap();
    let plain = r#"<svg width="4" height="4"><rect/></svg>"#;
    create_test_file(temp.path(), "icons/a/b.svg", plain);
    create_test_file(temp.path(), "icons/a_b.svg", plain);

    let result = run(temp.path(), test_options()).unwrap();
    assert_eq!(result.generated_count(), 2);
    assert!(read(temp.path(), "out/a/b.js").contains("'a/b': {"));
    assert!(read(temp.path(), "out/a_b.js").contains("'a_b': {"));
}

// ============================================================================
// Incremental Build Tests
// ============================================================================

#[test]
fn test_second_build_writes_nothing() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "icons/star.svg", STAR);
    create_test_file(temp.path(), "icons/ui/arrow.svg", STAR);

    run(temp.path(), test_options()).unwrap();
    let snapshot: Vec<(PathBuf, SystemTime, String)> =
        ["out/star.js", "out/ui/arrow.js", "out/index.js", "out/ui/index.js"]
            .iter()
            .map(|rel| {
                let path = temp.path().join(rel);
                let modified = fs::metadata(&path).unwrap().modified().unwrap();
                (path.clone(), modified, fs::read_to_string(&path).unwrap())
            })
            .collect();

    let result = run(temp.path(), test_options()).unwrap();
    let stats = IncrementalStats::from_result(&result);
    assert_eq!(stats.built, 0);
    assert_eq!(stats.skipped, 2);
    assert!(result.indexes.is_empty());

    for (path, modified, content) in snapshot {
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), modified);
        assert_eq!(fs::read_to_string(&path).unwrap(), content);
    }
}

#[test]
fn test_embedded_timestamp_matches_source() {
    let temp = TempDir::new().unwrap();
    let source = create_test_file(temp.path(), "icons/star.svg", STAR);

    run(temp.path(), test_options()).unwrap();

    let since_epoch = fs::metadata(&source)
        .unwrap()
        .modified()
        .unwrap()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap();
    let expected = since_epoch.as_nanos() as f64 / 1_000_000.0;
    assert_eq!(read_embedded_timestamp(&temp.path().join("out/star.js")), Some(expected));
}

#[test]
fn test_touched_source_is_rebuilt() {
    let temp = TempDir::new().unwrap();
    let star = create_test_file(temp.path(), "icons/star.svg", STAR);
    create_test_file(temp.path(), "icons/moon.svg", STAR);
    run(temp.path(), test_options()).unwrap();

    let later = SystemTime::now() + Duration::from_secs(10);
    File::options().write(true).open(&star).unwrap().set_modified(later).unwrap();

    let result = run(temp.path(), test_options()).unwrap();
    let generated: Vec<_> = result
        .assets
        .iter()
        .filter(|a| a.status == AssetStatus::Generated)
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(generated, vec!["star"]);
}

#[test]
fn test_tampered_output_is_rebuilt() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "icons/star.svg", STAR);
    run(temp.path(), test_options()).unwrap();

    let module = temp.path().join("out/star.js");
    fs::write(&module, "/* svgbundle lastMod: '1' */\nstale\n").unwrap();
    assert_eq!(run(temp.path(), test_options()).unwrap().generated_count(), 1);
    assert!(!read(temp.path(), "out/star.js").contains("stale"));

    fs::write(&module, "garbage without header").unwrap();
    assert_eq!(run(temp.path(), test_options()).unwrap().generated_count(), 1);

    fs::remove_file(&module).unwrap();
    assert_eq!(run(temp.path(), test_options()).unwrap().generated_count(), 1);
}

#[test]
fn test_new_asset_updates_index_only_where_needed() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "icons/star.svg", STAR);
    create_test_file(temp.path(), "icons/ui/arrow.svg", STAR);
    run(temp.path(), test_options()).unwrap();

    create_test_file(temp.path(), "icons/ui/close.svg", STAR);
    let result = run(temp.path(), test_options()).unwrap();

    assert_eq!(result.generated_count(), 1);
    assert_eq!(result.indexes, vec![temp.path().join("out/ui/index.js")]);
    assert!(read(temp.path(), "out/ui/index.js").contains("import './close.js'"));
}

// ============================================================================
// Optimizer Configuration Tests
// ============================================================================

#[test]
fn test_inline_optimizer_settings() {
    let temp = TempDir::new().unwrap();
    create_test_file(
        temp.path(),
        "icons/star.svg",
        r#"<svg width="4" height="4"><title>Star</title><rect/></svg>"#,
    );

    let settings = OptimizerSettings { remove_title: false, ..Default::default() };
    let options =
        BuildOptions { optimizer: Some(OptimizerConfig::Inline(settings)), ..test_options() };
    run(temp.path(), options).unwrap();
    assert!(read(temp.path(), "out/star.js").contains("<title>Star</title>"));
}

#[test]
fn test_missing_optimizer_file_fails() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "icons/star.svg", STAR);

    let options = BuildOptions {
        optimizer: Some(OptimizerConfig::Path(temp.path().join("missing.json"))),
        ..test_options()
    };
    assert!(matches!(run(temp.path(), options), Err(BuildError::Optimizer(_))));
}

// ============================================================================
// Failure Tests
// ============================================================================

#[test]
fn test_invalid_asset_aborts_before_indexing() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "icons/good.svg", STAR);
    let bad = create_test_file(temp.path(), "icons/bad.svg", "plain text");

    match run(temp.path(), test_options()) {
        Err(BuildError::Asset { path, .. }) => assert_eq!(path, bad),
        other => panic!("expected asset failure, got {:?}", other.map(|r| r.summary())),
    }
    assert!(!temp.path().join("out/index.js").exists());
}

// ============================================================================
// Progress Reporting Tests
// ============================================================================

#[test]
fn test_console_progress_lines() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "icons/star.svg", STAR);
    create_test_file(temp.path(), "icons/ui/arrow.svg", STAR);

    let output = Arc::new(Mutex::new(Vec::new()));
    let progress: Arc<dyn ProgressReporter> =
        Arc::new(ConsoleProgress::with_output(TestWriter(Arc::clone(&output))));
    BuildPipeline::new(BuildContext::new(test_options(), temp.path().to_path_buf()))
        .with_progress(progress)
        .build()
        .unwrap();

    let text = String::from_utf8_lossy(&output.lock().unwrap()).into_owned();
    assert!(text.contains("Generated icon: star"));
    assert!(text.contains("Generated icon: ui/arrow"));
    assert!(text.contains(&format!("Generated {}", Path::new("out").join("index.js").display())));
    assert!(text.contains(&format!(
        "Generated {}",
        Path::new("out").join("ui").join("index.js").display()
    )));
}

#[test]
fn test_json_progress_events() {
    let temp = TempDir::new().unwrap();
    create_test_file(temp.path(), "icons/star.svg", STAR);

    let output = Arc::new(Mutex::new(Vec::new()));
    let progress: Arc<dyn ProgressReporter> =
        Arc::new(JsonProgress::with_output(TestWriter(Arc::clone(&output))));
    BuildPipeline::new(BuildContext::new(test_options(), temp.path().to_path_buf()))
        .with_progress(progress)
        .build()
        .unwrap();

    let text = String::from_utf8_lossy(&output.lock().unwrap()).into_owned();
    let events: Vec<String> = text
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["event"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        events,
        vec!["build_started", "module_generated", "index_generated", "build_completed"]
    );
}
