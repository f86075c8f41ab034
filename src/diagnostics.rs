//! Shared wording for recoverable problems in the input batch.
//!
//! Warnings go through `tracing`; the binary decides where they end up.

use std::fmt::Display;

/// Report a recoverable problem in the input batch.
pub fn warn(msg: impl Display) {
    tracing::warn!(target: "trace_graph", "{}", msg);
}
