//! Error types for graph construction.
//!
//! Only construction can fail. Lookups on a built graph return `Option`.

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Which bootstrap array a failing record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Object,
    Call,
    Feedback,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordKind::Object => "object",
            RecordKind::Call => "call",
            RecordKind::Feedback => "feedback",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// A raw record is missing an identity field the graph cannot do without.
    #[error("invalid {kind} record #{index}: {reason}")]
    Record {
        kind: RecordKind,
        index: usize,
        reason: String,
    },

    /// The bootstrap payload could not be deserialized.
    #[error("malformed bootstrap payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn record(kind: RecordKind, index: usize, reason: impl Into<String>) -> Self {
        Error::Record {
            kind,
            index,
            reason: reason.into(),
        }
    }
}
