//! Serializable views over a built graph.

use crate::category::{OpCategory, TypeCategory};
use crate::project::{Call, ProjectGraph};

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct GraphSummary {
    pub entity: String,
    pub project: String,
    pub totals: TotalsView,
    pub ops: Vec<OpView>,
    pub types: Vec<TypeView>,
    pub objects: Vec<ObjectView>,
    pub traces: Vec<TraceRootsView>,
    pub op_categories: Vec<OpCategory>,
    pub type_categories: Vec<TypeCategory>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsView {
    pub types: usize,
    pub type_versions: usize,
    pub ops: usize,
    pub op_versions: usize,
    pub objects: usize,
    pub object_versions: usize,
    pub calls: usize,
    pub traces: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpView {
    pub name: String,
    pub category: Option<OpCategory>,
    pub versions: Vec<OpVersionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpVersionView {
    pub version: String,
    pub calls: usize,
    pub invokes: Vec<String>,
    pub invoked_by: Vec<String>,
    pub input_types: Vec<String>,
    pub output_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeView {
    pub name: String,
    pub category: Option<TypeCategory>,
    pub versions: Vec<TypeVersionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeVersionView {
    pub version: String,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub unknown: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectView {
    pub name: String,
    pub versions: Vec<ObjectVersionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectVersionView {
    pub version: String,
    pub type_version: Option<String>,
    pub input_to: Vec<String>,
    pub output_from: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceRootsView {
    pub trace_id: String,
    pub calls: usize,
    pub roots: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceView {
    pub trace_id: String,
    pub roots: Vec<CallNodeView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallNodeView {
    pub id: String,
    pub name: String,
    pub op_version: Option<String>,
    pub op_name: Option<String>,
    pub status_code: Option<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub feedback: usize,
    pub children: Vec<CallNodeView>,
}

fn versions_of<T>(items: Vec<T>, version: impl Fn(&T) -> &str) -> Vec<String> {
    items.iter().map(|i| version(i).to_string()).collect()
}

pub fn build_summary(graph: &ProjectGraph) -> GraphSummary {
    let ops: Vec<OpView> = graph
        .ops()
        .into_iter()
        .map(|op| OpView {
            name: op.name().to_string(),
            category: op.category(),
            versions: op
                .op_versions()
                .into_iter()
                .map(|ov| OpVersionView {
                    version: ov.version().to_string(),
                    calls: ov.calls().len(),
                    invokes: versions_of(ov.invokes(), |v| v.version()),
                    invoked_by: versions_of(ov.invoked_by(), |v| v.version()),
                    input_types: versions_of(ov.input_type_versions(), |v| v.version()),
                    output_types: versions_of(ov.output_type_versions(), |v| v.version()),
                })
                .collect(),
        })
        .collect();

    let types: Vec<TypeView> = graph
        .types()
        .into_iter()
        .map(|ty| TypeView {
            name: ty.name().to_string(),
            category: ty.category(),
            versions: ty
                .type_versions()
                .into_iter()
                .map(|tv| TypeVersionView {
                    version: tv.version().to_string(),
                    parent: tv.parent_type_version().map(|p| p.version().to_string()),
                    children: versions_of(tv.child_type_versions(), |v| v.version()),
                    unknown: tv.is_unknown(),
                })
                .collect(),
        })
        .collect();

    let objects: Vec<ObjectView> = graph
        .objects()
        .into_iter()
        .map(|obj| ObjectView {
            name: obj.name().to_string(),
            versions: obj
                .object_versions()
                .into_iter()
                .map(|ov| ObjectVersionView {
                    version: ov.version().to_string(),
                    type_version: ov.type_version().map(|t| t.version().to_string()),
                    input_to: versions_of(ov.input_to(), |c| c.id()),
                    output_from: versions_of(ov.output_from(), |c| c.id()),
                })
                .collect(),
        })
        .collect();

    let traces: Vec<TraceRootsView> = graph
        .trace_ids()
        .into_iter()
        .map(|trace_id| TraceRootsView {
            trace_id: trace_id.to_string(),
            calls: graph.trace_calls(trace_id).len(),
            roots: versions_of(graph.trace_roots(trace_id), |c| c.id()),
        })
        .collect();

    GraphSummary {
        entity: graph.entity().to_string(),
        project: graph.project().to_string(),
        totals: TotalsView {
            types: types.len(),
            type_versions: graph.type_versions().len(),
            ops: ops.len(),
            op_versions: graph.op_versions().len(),
            objects: objects.len(),
            object_versions: graph.object_versions().len(),
            calls: graph.calls().len(),
            traces: traces.len(),
        },
        ops,
        types,
        objects,
        traces,
        op_categories: graph.op_categories().to_vec(),
        type_categories: graph.type_categories().to_vec(),
    }
}

pub fn build_trace(graph: &ProjectGraph, trace_id: &str) -> TraceView {
    TraceView {
        trace_id: trace_id.to_string(),
        roots: graph
            .trace_roots(trace_id)
            .into_iter()
            .map(call_node)
            .collect(),
    }
}

// Each call has at most one parent and roots have none in the batch, so
// descending from a root cannot revisit a call.
fn call_node(call: Call<'_>) -> CallNodeView {
    let op_version = call.op_version();
    CallNodeView {
        id: call.id().to_string(),
        name: call.name().to_string(),
        op_version: op_version.map(|o| o.version().to_string()),
        op_name: op_version.map(|o| o.op_name().to_string()),
        status_code: call.status_code().map(str::to_string),
        inputs: versions_of(call.inputs(), |o| o.version()),
        outputs: versions_of(call.outputs(), |o| o.version()),
        feedback: call.feedback().len(),
        children: call.child_calls().into_iter().map(call_node).collect(),
    }
}
