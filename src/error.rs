use std::path::PathBuf;
use thiserror::Error;

/// Why a single clipboard token was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("expected {expected} '|' groups, found {found}")]
    GroupCount { expected: usize, found: usize },

    #[error("group {0} is empty")]
    EmptyGroup(usize),

    #[error("word text is empty")]
    EmptyWord,

    #[error("field `{field}` is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

/// Failures reading an uploaded transcript.
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid transcript JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transcript has no segments")]
    MissingSegments,
}

/// Failures loading or saving a session file.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid session JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported session version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("duplicate tab id {0}")]
    DuplicateTab(String),

    #[error("tab {tab}: {reason}")]
    InvalidTab { tab: String, reason: String },

    #[error("no tab with id {0}")]
    UnknownTab(String),
}
