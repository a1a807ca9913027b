//! Array-tuple layout: `[major, minor, {metadata}, [dir-meta, child...]]`.
//! A child that is an array is a directory, an object is a file.

use serde_json::{Map, Value};

use super::{
    aggregated_summary, check_siblings, dir_size, entry_name, file_size, required_name, scan_time,
    with_stack, DecodeOptions, Node, Trail,
};
use crate::error::FormatError;
use crate::types::{ExportFormat, ExportSummary};

pub(super) fn decode(
    items: &[Value],
    options: &DecodeOptions,
) -> Result<(ExportSummary, Node), FormatError> {
    let version = items
        .first()
        .and_then(Value::as_u64)
        .ok_or_else(|| FormatError::InvalidField {
            field: "[0] (format version)".into(),
            at: "export root".into(),
            expected: "a non-negative integer".into(),
        })?;

    let metadata = match items.get(2) {
        Some(Value::Object(meta)) => meta,
        _ => {
            return Err(FormatError::InvalidField {
                field: "[2] (metadata)".into(),
                at: "export root".into(),
                expected: "an object".into(),
            });
        }
    };

    let root = match items.get(3) {
        Some(Value::Array(dir)) => convert_root(dir, options)?,
        _ => {
            return Err(FormatError::InvalidField {
                field: "[3] (root directory)".into(),
                at: "export root".into(),
                expected: "an array".into(),
            });
        }
    };

    let root_path = if root.name.is_empty() {
        "/".to_string()
    } else {
        root.name.clone()
    };

    let summary = aggregated_summary(
        root_path,
        &root,
        scan_time(metadata.get("timestamp")),
        ExportFormat::ArrayTuple,
        version,
    );
    Ok((summary, root))
}

/// The root keeps its full scanned path as its name and may leave it empty.
fn convert_root(dir: &[Value], options: &DecodeOptions) -> Result<Node, FormatError> {
    let meta = dir_meta(dir, &Trail::root())?;
    let name = required_name(meta, || Trail::root().render())?;
    convert_dir(dir, meta, name, None, options)
}

fn dir_meta<'v>(dir: &'v [Value], at: &Trail<'_>) -> Result<&'v Map<String, Value>, FormatError> {
    dir.first()
        .and_then(Value::as_object)
        .ok_or_else(|| FormatError::MissingField {
            field: "directory metadata".into(),
            at: at.render(),
        })
}

fn convert_dir(
    dir: &[Value],
    meta: &Map<String, Value>,
    name: String,
    parent: Option<&Trail<'_>>,
    options: &DecodeOptions,
) -> Result<Node, FormatError> {
    let here = match parent {
        Some(parent) => parent.child(&name),
        None => Trail::root(),
    };

    let children = dir[1..]
        .iter()
        .enumerate()
        .map(|(index, child)| {
            let entry_at = || format!("{}[{}]", here.render(), index + 1);
            match child {
                Value::Array(sub) => {
                    let meta = dir_meta(sub, &here)?;
                    let name = entry_name(meta, entry_at)?;
                    with_stack(|| convert_dir(sub, meta, name, Some(&here), options))
                }
                Value::Object(file) => {
                    let name = entry_name(file, entry_at)?;
                    Ok(Node::new_file(name, file_size(file)))
                }
                _ => Err(FormatError::InvalidField {
                    field: format!("[{}]", index + 1),
                    at: here.render(),
                    expected: "a directory array or a file object".into(),
                }),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    check_siblings(&here, &children, options)?;

    let node = Node::new_dir(name, dir_size(meta), children);
    if meta.get("read_error").and_then(Value::as_bool) == Some(true) {
        return Ok(node.with_error("error reading directory"));
    }
    Ok(node)
}
