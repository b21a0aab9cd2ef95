//! Markup optimizer adapter.
//!
//! The optimization engine is pluggable through [`MarkupOptimizer`]; the
//! build only relies on its contract (markup in, optimized markup plus root
//! dimensions out). [`BasicOptimizer`] is the built-in implementation and
//! performs lossless cleanup only. It reads the document as an XML event
//! stream and writes it back, so attribute quoting in its output is always
//! double quotes regardless of how the source was written.
//!
//! [`optimize_asset`] wraps any optimizer and normalizes its metadata into
//! the numeric width/height and view-box string that end up in the module.

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

use crate::config::OptimizerConfig;

/// Width/height used when the root element has no usable dimension.
pub const DEFAULT_DIMENSION: f64 = 16.0;

/// View box used when neither a `viewBox` nor both dimensions are available.
pub const FALLBACK_VIEW_BOX: &str = "0 0 200 200";

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").unwrap()
});

/// Errors raised by an optimizer or while loading its configuration.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// The input is not usable SVG markup
    #[error("invalid SVG markup: {0}")]
    InvalidMarkup(String),
    /// The optimizer settings file could not be read
    #[error("failed to read optimizer config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The optimizer settings file could not be parsed
    #[error("failed to parse optimizer config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },
}

/// Root element dimensions reported by an optimizer, as written in the markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SvgInfo {
    /// Raw `width` attribute of the root element
    pub width: Option<String>,
    /// Raw `height` attribute of the root element
    pub height: Option<String>,
}

/// Output of a [`MarkupOptimizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Optimized {
    /// Optimized markup, still wrapped in its `<svg>` element
    pub data: String,
    /// Root element metadata
    pub info: SvgInfo,
}

/// An SVG optimization engine.
pub trait MarkupOptimizer: Send + Sync {
    /// Optimize one document.
    fn optimize(&self, markup: &str) -> Result<Optimized, OptimizeError>;
}

/// Settings for [`BasicOptimizer`]. Every step is enabled by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    /// Drop `<?xml ...?>`
    pub remove_xml_declaration: bool,
    /// Drop `<!DOCTYPE ...>`
    pub remove_doctype: bool,
    /// Drop `<!-- ... -->`
    pub remove_comments: bool,
    /// Drop `<metadata>` elements
    pub remove_metadata: bool,
    /// Drop `<title>` elements
    pub remove_title: bool,
    /// Drop `<desc>` elements
    pub remove_desc: bool,
    /// Collapse whitespace runs and remove whitespace between tags
    pub collapse_whitespace: bool,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            remove_xml_declaration: true,
            remove_doctype: true,
            remove_comments: true,
            remove_metadata: true,
            remove_title: true,
            remove_desc: true,
            collapse_whitespace: true,
        }
    }
}

/// Built-in optimizer: strips non-rendering content and redundant whitespace.
#[derive(Debug, Clone, Default)]
pub struct BasicOptimizer {
    settings: OptimizerSettings,
}

impl BasicOptimizer {
    /// Create an optimizer with the given settings.
    pub fn new(settings: OptimizerSettings) -> Self {
        Self { settings }
    }

    /// The active settings.
    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }
}

impl MarkupOptimizer for BasicOptimizer {
    fn optimize(&self, markup: &str) -> Result<Optimized, OptimizeError> {
        let s = &self.settings;
        let mut reader = Reader::from_str(markup);
        let mut writer = Writer::new(Vec::with_capacity(markup.len()));
        let mut info = None;
        let mut after_tag = true;

        loop {
            let event = reader.read_event().map_err(|e| {
                OptimizeError::InvalidMarkup(format!(
                    "XML parse error at position {}: {}",
                    reader.error_position(),
                    e
                ))
            })?;

            match event {
                Event::Eof => break,
                Event::Decl(_) if s.remove_xml_declaration => continue,
                Event::DocType(_) if s.remove_doctype => continue,
                Event::Comment(_) if s.remove_comments => continue,
                Event::Start(elem) if self.is_removed(&elem) => {
                    let end = elem.to_end().into_owned();
                    reader
                        .read_to_end(end.name())
                        .map_err(|e| OptimizeError::InvalidMarkup(e.to_string()))?;
                    continue;
                }
                Event::Empty(elem) if self.is_removed(&elem) => continue,
                Event::Start(elem) => {
                    capture_root(&elem, &mut info)?;
                    emit(&mut writer, Event::Start(self.normalize(&elem)?))?;
                    after_tag = true;
                }
                Event::Empty(elem) => {
                    capture_root(&elem, &mut info)?;
                    emit(&mut writer, Event::Empty(self.normalize(&elem)?))?;
                    after_tag = true;
                }
                Event::End(elem) => {
                    emit(&mut writer, Event::End(elem))?;
                    after_tag = true;
                }
                Event::Text(text) if s.collapse_whitespace => {
                    let raw = String::from_utf8_lossy(&text).into_owned();
                    if raw.trim().is_empty() && after_tag {
                        continue;
                    }
                    let collapsed = collapse_whitespace(&raw);
                    emit(&mut writer, Event::Text(BytesText::from_escaped(collapsed)))?;
                    after_tag = false;
                }
                other => {
                    after_tag = matches!(
                        other,
                        Event::Decl(_) | Event::DocType(_) | Event::Comment(_) | Event::PI(_)
                    );
                    emit(&mut writer, other)?;
                }
            }
        }

        let info = info
            .ok_or_else(|| OptimizeError::InvalidMarkup("no <svg> root element".to_string()))?;
        let data = String::from_utf8(writer.into_inner())
            .map_err(|e| OptimizeError::InvalidMarkup(e.to_string()))?;

        Ok(Optimized {
            data: data.trim().to_string(),
            info,
        })
    }
}

impl BasicOptimizer {
    /// Whether the element is dropped together with its content.
    fn is_removed(&self, elem: &BytesStart<'_>) -> bool {
        let s = &self.settings;
        match elem.local_name().as_ref() {
            b"metadata" => s.remove_metadata,
            b"title" => s.remove_title,
            b"desc" => s.remove_desc,
            _ => false,
        }
    }

    /// Re-emit an element with every attribute double-quoted.
    fn normalize(&self, elem: &BytesStart<'_>) -> Result<BytesStart<'static>, OptimizeError> {
        let mut out = elem.to_owned();
        out.clear_attributes();
        for attr in elem.attributes() {
            let attr = attr.map_err(|e| OptimizeError::InvalidMarkup(e.to_string()))?;
            let mut value = String::from_utf8_lossy(&attr.value).replace('"', "&quot;");
            if self.settings.collapse_whitespace {
                value = collapse_whitespace(&value).trim().to_string();
            }
            out.push_attribute(Attribute {
                key: attr.key,
                value: Cow::Owned(value.into_bytes()),
            });
        }
        Ok(out)
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), OptimizeError> {
    writer
        .write_event(event)
        .map_err(|e| OptimizeError::InvalidMarkup(e.to_string()))
}

/// Collapse whitespace runs to a single space.
fn collapse_whitespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_space = false;
    for c in raw.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Record the first `<svg>` element's dimensions.
fn capture_root(elem: &BytesStart<'_>, info: &mut Option<SvgInfo>) -> Result<(), OptimizeError> {
    if info.is_some() || elem.local_name().as_ref() != b"svg" {
        return Ok(());
    }
    *info = Some(SvgInfo {
        width: root_attribute(elem, b"width")?,
        height: root_attribute(elem, b"height")?,
    });
    Ok(())
}

/// A trimmed, non-empty attribute value.
fn root_attribute(elem: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, OptimizeError> {
    let attr = elem
        .try_get_attribute(name)
        .map_err(|e| OptimizeError::InvalidMarkup(e.to_string()))?;
    Ok(attr
        .map(|a| String::from_utf8_lossy(&a.value).trim().to_string())
        .filter(|v| !v.is_empty()))
}

/// The root element's `viewBox`, read from markup with either quote style.
fn root_view_box(markup: &str) -> Option<String> {
    let mut reader = Reader::from_str(markup);
    loop {
        match reader.read_event() {
            Ok(Event::Start(elem)) | Ok(Event::Empty(elem))
                if elem.local_name().as_ref() == b"svg" =>
            {
                return root_attribute(&elem, b"viewBox").ok().flatten();
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// Optimized markup with normalized metadata, ready for templating.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedAsset {
    /// Optimized markup, still wrapped in its `<svg>` element
    pub data: String,
    /// Numeric width
    pub width: f64,
    /// Numeric height
    pub height: f64,
    /// View box, four space-separated numbers
    pub view_box: String,
}

/// Run an optimizer and normalize its metadata.
pub fn optimize_asset(
    optimizer: &dyn MarkupOptimizer,
    markup: &str,
) -> Result<OptimizedAsset, OptimizeError> {
    let optimized = optimizer.optimize(markup)?;
    let view_box = resolve_view_box(&optimized.data, &optimized.info);
    Ok(OptimizedAsset {
        width: parse_dimension(optimized.info.width.as_deref()),
        height: parse_dimension(optimized.info.height.as_deref()),
        view_box,
        data: optimized.data,
    })
}

/// Parse the leading number of a dimension (`"24px"` is 24).
fn leading_number(raw: &str) -> Option<f64> {
    LEADING_NUMBER
        .find(raw)
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v != 0.0)
}

/// Numeric dimension, [`DEFAULT_DIMENSION`] when absent, non-numeric or zero.
pub fn parse_dimension(raw: Option<&str>) -> f64 {
    raw.and_then(leading_number).unwrap_or(DEFAULT_DIMENSION)
}

/// Resolve the view box.
///
/// Order: an explicit `viewBox` in the markup, then `0 0 {width} {height}`
/// when both dimensions are present and numeric, then [`FALLBACK_VIEW_BOX`].
pub fn resolve_view_box(data: &str, info: &SvgInfo) -> String {
    let explicit = root_view_box(data).and_then(|raw| {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let numeric = tokens.iter().all(|t| t.parse::<f64>().is_ok());
        (tokens.len() == 4 && numeric).then(|| tokens.join(" "))
    });
    if let Some(view_box) = explicit {
        return view_box;
    }

    let width = info.width.as_deref().and_then(leading_number);
    let height = info.height.as_deref().and_then(leading_number);
    match (width, height) {
        (Some(w), Some(h)) => format!("0 0 {} {}", w, h),
        _ => FALLBACK_VIEW_BOX.to_string(),
    }
}

/// Load optimizer settings from a JSON or TOML file.
pub fn load_settings_file(path: &Path) -> Result<OptimizerSettings, OptimizeError> {
    let contents = fs::read_to_string(path)
        .map_err(|source| OptimizeError::ConfigRead { path: path.to_path_buf(), source })?;

    let parse_error =
        |message: String| OptimizeError::ConfigParse { path: path.to_path_buf(), message };

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&contents).map_err(|e| parse_error(e.to_string())),
        _ => serde_json::from_str(&contents).map_err(|e| parse_error(e.to_string())),
    }
}

/// Build the optimizer described by the configuration.
///
/// Settings file paths are resolved against `cwd`.
pub fn load_optimizer(
    config: Option<&OptimizerConfig>,
    cwd: &Path,
) -> Result<Box<dyn MarkupOptimizer>, OptimizeError> {
    let settings = match config {
        None => OptimizerSettings::default(),
        Some(OptimizerConfig::Inline(settings)) => settings.clone(),
        Some(OptimizerConfig::Path(path)) => load_settings_file(&cwd.join(path))?,
    };
    Ok(Box::new(BasicOptimizer::new(settings)))
}
