//! Export decoding: raw disk-usage JSON to the canonical [`Node`] tree.
//!
//! Two layouts of the same logical format are accepted and told apart by the
//! top-level JSON shape alone:
//!
//! - an object carrying a `ver` marker and a `root` array of flag-tagged items
//!   (see [`flagged`]),
//! - an array of at least four elements whose last element is the root
//!   directory, with directories written as nested arrays (see [`tuple`]).
//!
//! Both converters are pure functions; no state survives between calls.

mod flagged;
mod node;
mod tuple;

#[cfg(test)]
mod tests;

pub use node::{Descendants, Node, NodeKind};

use std::collections::HashSet;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FormatError;
use crate::types::{ExportFormat, ExportSummary};

/// Knobs for a single decode call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Fail on duplicate sibling names instead of keeping the first one.
    #[serde(default)]
    pub reject_duplicate_names: bool,
}

/// Top-level shape of a parsed export, resolved once before conversion.
enum RawExport<'a> {
    Flagged(&'a Map<String, Value>),
    Tuple(&'a [Value]),
}

impl<'a> RawExport<'a> {
    fn detect(value: &'a Value) -> Result<Self, FormatError> {
        match value {
            Value::Object(map) if map.contains_key("ver") => Ok(RawExport::Flagged(map)),
            Value::Object(_) => Err(FormatError::MissingField {
                field: "ver".into(),
                at: "export root".into(),
            }),
            Value::Array(items) if items.len() >= 4 => Ok(RawExport::Tuple(items)),
            Value::Array(items) => Err(FormatError::UnrecognizedShape(format!(
                "array of {} elements, expected at least 4",
                items.len()
            ))),
            other => Err(FormatError::UnrecognizedShape(format!(
                "top-level {}",
                json_kind(other)
            ))),
        }
    }

    fn format(&self) -> ExportFormat {
        match self {
            RawExport::Flagged(_) => ExportFormat::FlaggedItem,
            RawExport::Tuple(_) => ExportFormat::ArrayTuple,
        }
    }
}

/// Decodes an export with default options.
pub fn decode(text: &str) -> Result<(ExportSummary, Node), FormatError> {
    decode_with(text, &DecodeOptions::default())
}

/// Decodes an export, returning its summary and the root of the canonical tree.
pub fn decode_with(
    text: &str,
    options: &DecodeOptions,
) -> Result<(ExportSummary, Node), FormatError> {
    let started = Instant::now();

    let mut de = serde_json::Deserializer::from_str(text);
    // exports mirror filesystem depth; nesting is bounded by memory, not the stack
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;

    let decoded = RawExport::detect(&value).and_then(|raw| {
        let format = raw.format();
        let (summary, root) = match raw {
            RawExport::Flagged(map) => flagged::decode(map, options)?,
            RawExport::Tuple(items) => tuple::decode(items, options)?,
        };
        Ok((format, summary, root))
    });
    release(value);
    let (format, summary, root) = decoded?;

    tracing::info!(
        ?format,
        root = %summary.root_path,
        files = root.file_count(),
        dirs = root.dir_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "decoded export"
    );

    Ok((summary, root))
}

/// Runs `f`, moving onto a fresh stack segment when the current one runs low.
pub(crate) fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    const RED_ZONE: usize = 64 * 1024;
    const SEGMENT: usize = 1024 * 1024;
    stacker::maybe_grow(RED_ZONE, SEGMENT, f)
}

/// Drops a parsed document level by level instead of recursively.
fn release(value: Value) {
    let mut pending = vec![value];
    while let Some(value) = pending.pop() {
        match value {
            Value::Array(items) => pending.extend(items),
            Value::Object(map) => pending.extend(map.into_iter().map(|(_, v)| v)),
            _ => {}
        }
    }
}

/// Where a node sits in the export. Rendered only for errors and warnings.
#[derive(Clone, Copy)]
struct Trail<'a> {
    parent: Option<&'a Trail<'a>>,
    name: &'a str,
}

impl Trail<'static> {
    fn root() -> Self {
        Trail {
            parent: None,
            name: "",
        }
    }
}

impl<'a> Trail<'a> {
    fn child(&'a self, name: &'a str) -> Trail<'a> {
        Trail {
            parent: Some(self),
            name,
        }
    }

    /// Slash path from the root, e.g. `/home/user`; the root itself is `/`.
    fn render(&self) -> String {
        let mut names = Vec::new();
        let mut at = Some(self);
        while let Some(trail) = at {
            if trail.parent.is_some() {
                names.push(trail.name);
            }
            at = trail.parent;
        }
        names.reverse();
        format!("/{}", names.join("/"))
    }
}

/// Summary for exports that carry no filesystem statistics of their own.
fn aggregated_summary(
    root_path: String,
    root: &Node,
    scan_time: SystemTime,
    format: ExportFormat,
    version: u64,
) -> ExportSummary {
    ExportSummary {
        root_path,
        total_size: root.total_size(),
        available_space: 0,
        total_files: root.file_count(),
        max_files: 0,
        scan_time,
        format,
        version,
    }
}

fn size_field(obj: &Map<String, Value>, key: &str) -> Option<u64> {
    obj.get(key).and_then(Value::as_u64)
}

/// Apparent size, then disk size, then zero.
fn file_size(obj: &Map<String, Value>) -> u64 {
    size_field(obj, "asize")
        .or_else(|| size_field(obj, "dsize"))
        .unwrap_or(0)
}

/// Declared directory size: disk size, then apparent size, then zero.
fn dir_size(obj: &Map<String, Value>) -> u64 {
    size_field(obj, "dsize")
        .or_else(|| size_field(obj, "asize"))
        .unwrap_or(0)
}

fn required_name(
    obj: &Map<String, Value>,
    at: impl FnOnce() -> String,
) -> Result<String, FormatError> {
    match obj.get("name") {
        Some(Value::String(name)) => Ok(name.clone()),
        Some(_) => Err(FormatError::InvalidField {
            field: "name".into(),
            at: at(),
            expected: "a string".into(),
        }),
        None => Err(FormatError::MissingField {
            field: "name".into(),
            at: at(),
        }),
    }
}

/// Name of a node below the root. Empty names can't form a path segment.
fn entry_name(obj: &Map<String, Value>, at: impl Fn() -> String) -> Result<String, FormatError> {
    let name = required_name(obj, &at)?;
    if name.is_empty() {
        return Err(FormatError::InvalidField {
            field: "name".into(),
            at: at(),
            expected: "a non-empty string".into(),
        });
    }
    Ok(name)
}

/// Seconds since the epoch; missing or malformed timestamps map to the epoch.
fn scan_time(timestamp: Option<&Value>) -> SystemTime {
    timestamp
        .and_then(|t| match t.as_u64() {
            Some(secs) => Some(Duration::from_secs(secs)),
            None => t.as_f64().and_then(|s| Duration::try_from_secs_f64(s).ok()),
        })
        .and_then(|since_epoch| UNIX_EPOCH.checked_add(since_epoch))
        .unwrap_or(UNIX_EPOCH)
}

/// Applies the duplicate-name policy to one directory's children.
fn check_siblings(
    at: &Trail<'_>,
    children: &[Node],
    options: &DecodeOptions,
) -> Result<(), FormatError> {
    let mut seen = HashSet::with_capacity(children.len());
    for child in children {
        if seen.insert(child.name.as_str()) {
            continue;
        }
        if options.reject_duplicate_names {
            return Err(FormatError::DuplicateName {
                parent: at.render(),
                name: child.name.clone(),
            });
        }
        tracing::warn!(parent = %at.render(), name = %child.name, "duplicate sibling name, first entry wins");
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
