//! Pass 2: derived relations over complete registries.
//!
//! Every reverse edge is indexed once here so graph accessors are map
//! lookups. All sets are `BTreeSet`s: distinct and in id order.

use crate::registry::Registries;

use std::collections::{BTreeMap, BTreeSet};

pub type Index = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, Default)]
pub struct Relations {
    /// type name -> type-versions
    pub type_versions_by_type: Index,
    /// op name -> op-versions
    pub op_versions_by_op: Index,
    /// object name -> object-versions
    pub object_versions_by_object: Index,

    /// type-version -> type-versions whose parent it is
    pub child_type_versions: Index,
    /// type-version -> object-versions of that type
    pub object_versions_by_type_version: Index,

    /// op-version -> calls of that op-version
    pub calls_by_op_version: Index,
    /// op-version -> the single call sampled for invokes / type sets
    pub example_call: BTreeMap<String, String>,
    pub invokes: Index,
    pub invoked_by: Index,
    pub input_type_versions: Index,
    pub output_type_versions: Index,

    /// type-version -> op-versions that take / produce it
    pub type_input_to: Index,
    pub type_output_from: Index,

    /// object-version -> calls
    pub object_input_to: Index,
    pub object_output_from: Index,

    /// call -> direct children
    pub child_calls: Index,
    /// trace -> all calls
    pub calls_by_trace: Index,
    /// trace -> calls whose parent is absent or not in the batch
    pub trace_roots: Index,
}

fn link(index: &mut Index, from: &str, to: &str) {
    index
        .entry(from.to_string())
        .or_default()
        .insert(to.to_string());
}

impl Relations {
    pub fn resolve(reg: &Registries) -> Self {
        let mut rel = Relations::default();

        // Unversioned groupings by owning name.
        for tv in reg.type_versions.values() {
            link(&mut rel.type_versions_by_type, &tv.type_name, &tv.version);
            if let Some(parent) = &tv.parent {
                link(&mut rel.child_type_versions, parent, &tv.version);
            }
        }
        for ov in reg.op_versions.values() {
            link(&mut rel.op_versions_by_op, &ov.op_name, &ov.version);
        }
        for ov in reg.object_versions.values() {
            link(&mut rel.object_versions_by_object, &ov.object_name, &ov.version);
            link(&mut rel.object_versions_by_type_version, &ov.type_version, &ov.version);
        }

        // Calls: tree edges, traces, object usage.
        for call in reg.calls.values() {
            link(&mut rel.calls_by_trace, &call.trace_id, &call.span_id);

            match call.parent_id.as_deref().filter(|p| reg.calls.contains_key(*p)) {
                Some(parent) => link(&mut rel.child_calls, parent, &call.span_id),
                None => link(&mut rel.trace_roots, &call.trace_id, &call.span_id),
            }

            if let Some(op_version) = &call.op_version {
                link(&mut rel.calls_by_op_version, op_version, &call.span_id);
                // Calls iterate in span id order, so the first one seen is the smallest.
                rel.example_call
                    .entry(op_version.clone())
                    .or_insert_with(|| call.span_id.clone());
            }

            for input in &call.inputs {
                link(&mut rel.object_input_to, input, &call.span_id);
            }
            for output in &call.outputs {
                link(&mut rel.object_output_from, output, &call.span_id);
            }
        }

        // Op-version edges sampled from one representative call each.
        for (op_version, span_id) in &rel.example_call {
            let Some(call) = reg.calls.get(span_id) else {
                continue;
            };

            if let Some(children) = rel.child_calls.get(span_id) {
                for child_id in children {
                    let child_op = reg.calls.get(child_id).and_then(|c| c.op_version.as_deref());
                    if let Some(child_op) = child_op {
                        link(&mut rel.invokes, op_version, child_op);
                        link(&mut rel.invoked_by, child_op, op_version);
                    }
                }
            }

            for input in &call.inputs {
                if let Some(ov) = reg.object_versions.get(input) {
                    link(&mut rel.input_type_versions, op_version, &ov.type_version);
                    link(&mut rel.type_input_to, &ov.type_version, op_version);
                }
            }
            for output in &call.outputs {
                if let Some(ov) = reg.object_versions.get(output) {
                    link(&mut rel.output_type_versions, op_version, &ov.type_version);
                    link(&mut rel.type_output_from, &ov.type_version, op_version);
                }
            }
        }

        rel
    }
}

/// Ids stored under `key`, or nothing.
pub fn members<'a>(index: &'a Index, key: &str) -> impl Iterator<Item = &'a str> + use<'a> {
    index
        .get(key)
        .into_iter()
        .flat_map(|set| set.iter().map(String::as_str))
}
