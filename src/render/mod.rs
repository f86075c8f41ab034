//! JSON rendering of a built graph for the command-line tool.

pub mod view;

pub use view::{CallNodeView, GraphSummary, TraceView, build_summary, build_trace};

use crate::project::ProjectGraph;

/// Render the whole-graph summary as pretty JSON.
pub fn render_summary_json(graph: &ProjectGraph) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&build_summary(graph))
}

/// Render one trace's call forest as pretty JSON.
pub fn render_trace_json(graph: &ProjectGraph, trace_id: &str) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&build_trace(graph, trace_id))
}
