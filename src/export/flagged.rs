//! Flagged-item layout: every node is an object and a bit in `flags` says
//! whether it is a directory.

use std::time::SystemTime;

use serde_json::{Map, Value};

use super::{
    aggregated_summary, check_siblings, dir_size, entry_name, file_size, scan_time, with_stack,
    DecodeOptions, Node, Trail,
};
use crate::error::FormatError;
use crate::types::{ExportFormat, ExportSummary};

const FLAG_DIR: u64 = 0x1;
const FLAG_ERROR: u64 = 0x8;

const DEFAULT_BLOCK_SIZE: u64 = 4096;

pub(super) fn decode(
    map: &Map<String, Value>,
    options: &DecodeOptions,
) -> Result<(ExportSummary, Node), FormatError> {
    let version = map
        .get("ver")
        .and_then(Value::as_u64)
        .ok_or_else(|| FormatError::InvalidField {
            field: "ver".into(),
            at: "export root".into(),
            expected: "a non-negative integer".into(),
        })?;

    let items = match map.get("root") {
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(FormatError::InvalidField {
                field: "root".into(),
                at: "export root".into(),
                expected: "an array".into(),
            });
        }
        None => {
            return Err(FormatError::MissingField {
                field: "root".into(),
                at: "export root".into(),
            });
        }
    };

    let root_path = map
        .get("rootPath")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
        .unwrap_or("/")
        .to_string();
    let scanned = scan_time(map.get("prog").and_then(|prog| prog.get("timestamp")));

    let children = convert_items(items, &Trail::root(), options)?;
    let root = Node::new_dir(root_path.clone(), 0, children);

    let summary = match map.get("fsinfo").and_then(Value::as_object) {
        Some(fsinfo) => fsinfo_summary(fsinfo, root_path, scanned, version),
        None => aggregated_summary(root_path, &root, scanned, ExportFormat::FlaggedItem, version),
    };

    Ok((summary, root))
}

fn fsinfo_summary(
    fsinfo: &Map<String, Value>,
    root_path: String,
    scan_time: SystemTime,
    version: u64,
) -> ExportSummary {
    let field = |key: &str| fsinfo.get(key).and_then(Value::as_u64).unwrap_or(0);
    let block_size = fsinfo
        .get("bsize")
        .and_then(Value::as_u64)
        .unwrap_or(DEFAULT_BLOCK_SIZE);
    let files = field("files");

    ExportSummary {
        root_path,
        total_size: field("blocks").saturating_mul(block_size),
        available_space: field("bavail").saturating_mul(block_size),
        total_files: files,
        max_files: files.saturating_add(field("ffree")),
        scan_time,
        format: ExportFormat::FlaggedItem,
        version,
    }
}

fn convert_items(
    items: &[Value],
    parent: &Trail<'_>,
    options: &DecodeOptions,
) -> Result<Vec<Node>, FormatError> {
    let children = items
        .iter()
        .enumerate()
        .map(|(index, item)| convert_item(item, parent, index, options))
        .collect::<Result<Vec<_>, _>>()?;
    check_siblings(parent, &children, options)?;
    Ok(children)
}

fn convert_item(
    item: &Value,
    parent: &Trail<'_>,
    index: usize,
    options: &DecodeOptions,
) -> Result<Node, FormatError> {
    let entry_at = || format!("{}[{index}]", parent.render());
    let obj = item.as_object().ok_or_else(|| FormatError::InvalidField {
        field: "item".into(),
        at: entry_at(),
        expected: "an object".into(),
    })?;

    let name = entry_name(obj, entry_at)?;
    let here = parent.child(&name);

    let flags = obj
        .get("flags")
        .ok_or_else(|| FormatError::MissingField {
            field: "flags".into(),
            at: here.render(),
        })?
        .as_u64()
        .ok_or_else(|| FormatError::InvalidField {
            field: "flags".into(),
            at: here.render(),
            expected: "a non-negative integer".into(),
        })?;

    let node = if flags & FLAG_DIR != 0 {
        let items = match obj.get("items") {
            Some(Value::Array(items)) => items,
            _ => return Err(FormatError::MissingChildren(here.render())),
        };
        let children = with_stack(|| convert_items(items, &here, options))?;
        Node::new_dir(name, dir_size(obj), children)
    } else {
        Node::new_file(name, file_size(obj))
    };

    if flags & FLAG_ERROR != 0 {
        let message = obj
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("error reading directory");
        return Ok(node.with_error(message));
    }
    Ok(node)
}
