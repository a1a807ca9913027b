//! Tests for export decoding.

use super::*;
use serde_json::json;
use std::time::Duration;

fn flagged_export() -> Value {
    json!({
        "ver": 2,
        "prog": {"progname": "ncdu", "progver": "2.7", "timestamp": 1_700_000_000},
        "rootPath": "/home/users",
        "fsinfo": {"bavail": 100, "blocks": 1000, "bsize": 4096, "files": 31, "ffree": 14},
        "root": [
            {"name": "user1", "dsize": 1000, "flags": 1, "items": [
                {"name": "data.bin", "asize": 600, "dsize": 4096, "flags": 4},
                {"name": "results", "dsize": 400, "flags": 1, "items": [
                    {"name": "output.log", "dsize": 300, "flags": 4}
                ]}
            ]},
            {"name": "locked", "dsize": 0, "flags": 9, "items": [], "error": "permission denied"},
            {"name": "readme.txt", "asize": 10, "flags": 4}
        ]
    })
}

fn tuple_export() -> Value {
    json!([
        1,
        2,
        {"progname": "ncdu", "progver": "2.3", "timestamp": 1_600_000_000},
        [
            {"name": "/srv", "asize": 4096, "dsize": 4096},
            {"name": "notes.md", "asize": 120, "dsize": 4096},
            [
                {"name": "media", "dsize": 8192},
                {"name": "clip.mp4", "dsize": 2048},
                {"name": "empty"}
            ],
            [
                {"name": "broken", "read_error": true}
            ]
        ]
    ])
}

fn decode_value(value: &Value) -> Result<(ExportSummary, Node), FormatError> {
    decode(&value.to_string())
}

#[test]
fn test_flagged_tree_shape() {
    let (_, root) = decode_value(&flagged_export()).unwrap();

    assert_eq!(root.name, "/home/users");
    assert!(root.is_dir());
    let names: Vec<_> = root.children().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["user1", "locked", "readme.txt"]);

    let user1 = root.child("user1").unwrap();
    assert_eq!(user1.size, 1000);
    assert!(user1.is_dir());

    // apparent size wins over disk size for files
    assert_eq!(user1.child("data.bin").unwrap().size, 600);
    // disk size is the fallback
    let results = user1.child("results").unwrap();
    assert_eq!(results.child("output.log").unwrap().size, 300);

    assert!(root.child("readme.txt").unwrap().is_file());
}

#[test]
fn test_flagged_error_bit_keeps_message() {
    let (_, root) = decode_value(&flagged_export()).unwrap();
    let locked = root.child("locked").unwrap();
    assert!(locked.is_dir());
    assert_eq!(locked.error.as_deref(), Some("permission denied"));
}

#[test]
fn test_flagged_summary_from_fsinfo() {
    let (summary, _) = decode_value(&flagged_export()).unwrap();

    assert_eq!(summary.root_path, "/home/users");
    assert_eq!(summary.format, ExportFormat::FlaggedItem);
    assert_eq!(summary.version, 2);
    assert_eq!(summary.total_size, 1000 * 4096);
    assert_eq!(summary.available_space, 100 * 4096);
    assert_eq!(summary.total_files, 31);
    assert_eq!(summary.max_files, 45);
    assert_eq!(summary.scan_time, UNIX_EPOCH + Duration::from_secs(1_700_000_000));
}

#[test]
fn test_flagged_summary_without_fsinfo_is_aggregated() {
    let mut export = flagged_export();
    export.as_object_mut().unwrap().remove("fsinfo");
    export.as_object_mut().unwrap().remove("rootPath");

    let (summary, root) = decode_value(&export).unwrap();
    assert_eq!(root.name, "/");
    assert_eq!(summary.root_path, "/");
    assert_eq!(summary.total_size, 600 + 300 + 10);
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.available_space, 0);
    assert_eq!(summary.max_files, 0);
}

#[test]
fn test_missing_sizes_default_to_zero() {
    let export = json!({"ver": 1, "root": [
        {"name": "ghost", "flags": 4},
        {"name": "dir", "flags": 1, "items": []}
    ]});
    let (_, root) = decode_value(&export).unwrap();
    assert_eq!(root.child("ghost").unwrap().size, 0);
    assert_eq!(root.child("dir").unwrap().size, 0);
}

#[test]
fn test_directory_without_items_is_rejected() {
    let export = json!({"ver": 1, "root": [
        {"name": "a", "flags": 1, "items": [
            {"name": "b", "flags": 1}
        ]}
    ]});
    let err = decode_value(&export).unwrap_err();
    assert_eq!(err, FormatError::MissingChildren("/a/b".into()));
}

#[test]
fn test_missing_required_fields() {
    let no_name = json!({"ver": 1, "root": [{"flags": 4, "asize": 3}]});
    assert!(matches!(
        decode_value(&no_name),
        Err(FormatError::MissingField { ref field, .. }) if field == "name"
    ));

    let no_version = json!({"root": []});
    assert!(matches!(
        decode_value(&no_version),
        Err(FormatError::MissingField { ref field, .. }) if field == "ver"
    ));

    let no_root = json!({"ver": 1});
    assert!(matches!(
        decode_value(&no_root),
        Err(FormatError::MissingField { ref field, .. }) if field == "root"
    ));

    let no_flags = json!({"ver": 1, "root": [{"name": "x"}]});
    assert!(matches!(
        decode_value(&no_flags),
        Err(FormatError::MissingField { ref field, .. }) if field == "flags"
    ));
}

#[test]
fn test_unrecognized_shapes() {
    assert!(matches!(decode("\"hello\""), Err(FormatError::UnrecognizedShape(_))));
    assert!(matches!(decode("[1, 2, {}]"), Err(FormatError::UnrecognizedShape(_))));
    assert!(matches!(decode("42"), Err(FormatError::UnrecognizedShape(_))));
    assert!(matches!(decode("{not json"), Err(FormatError::Json(_))));
    assert!(matches!(decode("{} trailing"), Err(FormatError::Json(_))));
}

#[test]
fn test_tuple_tree_shape() {
    let (_, root) = decode_value(&tuple_export()).unwrap();

    assert_eq!(root.name, "/srv");
    assert_eq!(root.size, 4096);
    let names: Vec<_> = root.children().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["notes.md", "media", "broken"]);

    let notes = root.child("notes.md").unwrap();
    assert!(notes.is_file());
    assert_eq!(notes.size, 120);

    let media = root.child("media").unwrap();
    assert!(media.is_dir());
    assert_eq!(media.size, 8192);
    assert_eq!(media.child("clip.mp4").unwrap().size, 2048);
    assert_eq!(media.child("empty").unwrap().size, 0);

    assert_eq!(
        root.child("broken").unwrap().error.as_deref(),
        Some("error reading directory")
    );
}

#[test]
fn test_tuple_summary_counts_files_only() {
    let (summary, root) = decode_value(&tuple_export()).unwrap();

    assert_eq!(summary.format, ExportFormat::ArrayTuple);
    assert_eq!(summary.version, 1);
    assert_eq!(summary.root_path, "/srv");
    // declared directory sizes (4096, 8192) never enter the total
    assert_eq!(summary.total_size, 120 + 2048);
    assert_eq!(summary.total_size, root.total_size());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.scan_time, UNIX_EPOCH + Duration::from_secs(1_600_000_000));
}

#[test]
fn test_tuple_rejects_malformed_children() {
    let bad_child = json!([1, 0, {}, [{"name": "/"}, 17]]);
    assert!(matches!(
        decode_value(&bad_child),
        Err(FormatError::InvalidField { ref at, .. }) if at == "/"
    ));

    let bad_version = json!(["one", 0, {}, [{"name": "/"}]]);
    assert!(matches!(decode_value(&bad_version), Err(FormatError::InvalidField { .. })));

    let empty_dir = json!([1, 0, {}, [{"name": "/"}, []]]);
    assert!(matches!(decode_value(&empty_dir), Err(FormatError::MissingField { .. })));
}

#[test]
fn test_duplicate_names_kept_by_default() {
    let export = json!({"ver": 1, "root": [
        {"name": "twin", "asize": 1, "flags": 4},
        {"name": "twin", "asize": 2, "flags": 4}
    ]});
    let (_, root) = decode_value(&export).unwrap();
    assert_eq!(root.children().len(), 2);
    assert_eq!(root.child("twin").unwrap().size, 1);
}

#[test]
fn test_duplicate_names_rejected_when_strict() {
    let export = json!([1, 0, {}, [
        {"name": "/data"},
        {"name": "twin", "asize": 1},
        [{"name": "twin"}]
    ]]);
    let options = DecodeOptions {
        reject_duplicate_names: true,
    };
    let err = decode_with(&export.to_string(), &options).unwrap_err();
    assert_eq!(
        err,
        FormatError::DuplicateName {
            parent: "/".into(),
            name: "twin".into()
        }
    );
}

/// Directory chain `depth` levels deep in the array-tuple layout, one file at the bottom.
fn deep_tuple_export(depth: usize) -> String {
    let mut text = String::from("[1, 0, {}, [{\"name\": \"/\"}, ");
    for _ in 0..depth {
        text.push_str("[{\"name\": \"d\"}, ");
    }
    text.push_str("{\"name\": \"leaf\", \"asize\": 7}");
    text.push_str(&"]".repeat(depth + 1));
    text.push(']');
    text
}

/// Same chain in the flagged-item layout.
fn deep_flagged_export(depth: usize) -> String {
    let mut text = String::from("{\"ver\": 1, \"root\": [");
    for _ in 0..depth {
        text.push_str("{\"name\": \"d\", \"flags\": 1, \"items\": [");
    }
    text.push_str("{\"name\": \"leaf\", \"asize\": 7, \"flags\": 4}");
    text.push_str(&"]}".repeat(depth));
    text.push_str("]}");
    text
}

#[test]
fn test_deep_nesting_is_not_limited() {
    let depth = 10_000;

    let (summary, root) = decode(&deep_tuple_export(depth)).unwrap();
    assert_eq!(summary.total_files, 1);
    assert_eq!(root.total_size(), 7);
    assert_eq!(root.dir_count(), depth as u64 + 1);

    let (summary, root) = decode(&deep_flagged_export(depth)).unwrap();
    assert_eq!(summary.total_files, 1);
    assert_eq!(root.total_size(), 7);
    assert_eq!(root.dir_count(), depth as u64 + 1);
}

#[test]
fn test_deep_malformed_export_fails_cleanly() {
    // the leaf is missing its flags, so conversion fails at the bottom of the chain
    let text = deep_flagged_export(10_000)
        .replace("\"asize\": 7, \"flags\": 4", "\"asize\": 7");
    match decode(&text).unwrap_err() {
        FormatError::MissingField { field, at } => {
            assert_eq!(field, "flags");
            assert!(at.ends_with("/d/d/leaf"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_sizes_saturate_instead_of_wrapping() {
    let half = u64::MAX / 2 + 1;
    let export = json!([1, 0, {}, [
        {"name": "/"},
        {"name": "a", "asize": half},
        {"name": "b", "asize": half}
    ]]);
    let (summary, root) = decode_value(&export).unwrap();
    assert_eq!(root.total_size(), u64::MAX);
    assert_eq!(summary.total_size, u64::MAX);
    assert_eq!(summary.total_files, 2);
}

#[test]
fn test_empty_names_rejected() {
    let flagged = json!({"ver": 1, "root": [{"name": "", "flags": 1, "items": []}]});
    assert!(matches!(
        decode_value(&flagged),
        Err(FormatError::InvalidField { ref field, ref at, .. }) if field == "name" && at == "/[0]"
    ));

    let nested_file = json!([1, 0, {}, [{"name": "/"}, [{"name": "sub"}, {"name": ""}]]]);
    assert!(matches!(
        decode_value(&nested_file),
        Err(FormatError::InvalidField { ref field, ref at, .. }) if field == "name" && at == "/sub[1]"
    ));

    let nested_dir = json!([1, 0, {}, [{"name": "/"}, [{"name": ""}]]]);
    assert!(matches!(
        decode_value(&nested_dir),
        Err(FormatError::InvalidField { ref field, .. }) if field == "name"
    ));

    // the tuple root may leave its name out entirely
    let unnamed_root = json!([1, 0, {}, [{"name": ""}, {"name": "f", "asize": 1}]]);
    let (summary, root) = decode_value(&unnamed_root).unwrap();
    assert_eq!(summary.root_path, "/");
    assert_eq!(root.children().len(), 1);
}

#[test]
fn test_aggregates() {
    let tree = Node::new_dir(
        "root",
        999,
        vec![
            Node::new_file("a", 5),
            Node::new_dir("empty", 100, vec![]),
            Node::new_dir("sub", 0, vec![Node::new_file("b", 7), Node::new_file("c", 0)]),
        ],
    );
    assert_eq!(tree.total_size(), 12);
    assert_eq!(tree.file_count(), 3);
    assert_eq!(tree.dir_count(), 3);
    assert_eq!(Node::new_dir("none", 50, vec![]).file_count(), 0);
    assert_eq!(Node::new_file("f", 3).file_count(), 1);
}
