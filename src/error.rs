use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural problems found while decoding an export.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FormatError {
    #[error("invalid JSON: {0}")]
    Json(String),

    #[error("unrecognized export shape: {0}")]
    UnrecognizedShape(String),

    #[error("missing field `{field}` at {at}")]
    MissingField { field: String, at: String },

    #[error("field `{field}` at {at} is not {expected}")]
    InvalidField {
        field: String,
        at: String,
        expected: String,
    },

    #[error("directory without children at {0}")]
    MissingChildren(String),

    #[error("duplicate name `{name}` in {parent}")]
    DuplicateName { parent: String, name: String },
}

impl From<serde_json::Error> for FormatError {
    fn from(e: serde_json::Error) -> Self {
        FormatError::Json(e.to_string())
    }
}

#[derive(Debug, Error, Serialize, Deserialize)]
pub enum ExplorerError {
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("export source error: {0}")]
    Source(String),

    // std::io::Error is stringified so it works with Serialize/Deserialize
    #[error("system I/O error: {0}")]
    SystemIo(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("background task failed: {0}")]
    Task(String),
}

impl From<std::io::Error> for ExplorerError {
    fn from(e: std::io::Error) -> Self {
        ExplorerError::SystemIo(e.to_string())
    }
}

impl From<tokio::task::JoinError> for ExplorerError {
    fn from(e: tokio::task::JoinError) -> Self {
        ExplorerError::Task(e.to_string())
    }
}

pub type ExplorerResult<T> = Result<T, ExplorerError>;
