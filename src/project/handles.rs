//! Borrowed handles into a built [`ProjectGraph`].
//!
//! Handles are `Copy` and cheap; navigation methods return further handles
//! with the same lifetime. Two handles are equal when they name the same id
//! in the same graph.

use crate::category::{OpCategory, TypeCategory, classify_op_category, classify_type_category};
use crate::project::ProjectGraph;
use crate::raw::FeedbackRecord;
use crate::refuri::RefUri;
use crate::registry::{CallEntry, ObjectVersionEntry, OpVersionEntry, TypeVersionEntry};
use crate::resolve::members;
use crate::typetree::TypeTree;

use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

macro_rules! identity {
    ($handle:ident, $id:ident) => {
        impl PartialEq for $handle<'_> {
            fn eq(&self, other: &Self) -> bool {
                std::ptr::eq(self.graph, other.graph) && self.$id() == other.$id()
            }
        }

        impl Eq for $handle<'_> {}

        impl fmt::Debug for $handle<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($handle)).field(&self.$id()).finish()
            }
        }
    };
}

fn ref_uri(graph: &ProjectGraph, name: &str, version: &str) -> RefUri {
    RefUri::new(graph.entity(), graph.project(), name, version)
}

// ---------------------------------------------------------------------------
// Types

#[derive(Clone, Copy)]
pub struct Type<'g> {
    graph: &'g ProjectGraph,
    name: &'g str,
}

identity!(Type, name);

impl<'g> Type<'g> {
    pub(crate) fn new(graph: &'g ProjectGraph, name: &'g str) -> Self {
        Self { graph, name }
    }

    pub fn name(&self) -> &'g str {
        self.name
    }

    pub fn type_versions(&self) -> Vec<TypeVersion<'g>> {
        let graph = self.graph;
        members(&graph.relations().type_versions_by_type, self.name)
            .filter_map(|v| graph.type_version(v))
            .collect()
    }

    pub fn category(&self) -> Option<TypeCategory> {
        classify_type_category(self.name)
    }
}

#[derive(Clone, Copy)]
pub struct TypeVersion<'g> {
    graph: &'g ProjectGraph,
    entry: &'g TypeVersionEntry,
}

identity!(TypeVersion, version);

impl<'g> TypeVersion<'g> {
    pub(crate) fn new(graph: &'g ProjectGraph, entry: &'g TypeVersionEntry) -> Self {
        Self { graph, entry }
    }

    pub fn version(&self) -> &'g str {
        &self.entry.version
    }

    pub fn type_name(&self) -> &'g str {
        &self.entry.type_name
    }

    pub fn type_(&self) -> Type<'g> {
        Type::new(self.graph, &self.entry.type_name)
    }

    pub fn structure(&self) -> &'g TypeTree {
        &self.entry.structure
    }

    /// JSON the description was recovered from, when it arrived encoded.
    pub fn encoded(&self) -> Option<&'g str> {
        self.entry.encoded.as_deref()
    }

    pub fn is_unknown(&self) -> bool {
        self.entry.unknown
    }

    pub fn category(&self) -> Option<TypeCategory> {
        classify_type_category(&self.entry.type_name)
    }

    pub fn parent_type_version(&self) -> Option<TypeVersion<'g>> {
        self.graph.type_version(self.entry.parent.as_deref()?)
    }

    pub fn child_type_versions(&self) -> Vec<TypeVersion<'g>> {
        let graph = self.graph;
        members(&graph.relations().child_type_versions, self.version())
            .filter_map(|v| graph.type_version(v))
            .collect()
    }

    /// Parent, grandparent, ... nearest first. Stops on a repeated hash.
    pub fn ancestors(&self) -> Vec<TypeVersion<'g>> {
        let mut seen = BTreeSet::from([self.version()]);
        let mut out = Vec::new();
        let mut cur = self.parent_type_version();
        while let Some(tv) = cur {
            if !seen.insert(tv.version()) {
                break;
            }
            out.push(tv);
            cur = tv.parent_type_version();
        }
        out
    }

    pub fn object_versions(&self) -> Vec<ObjectVersion<'g>> {
        let graph = self.graph;
        members(&graph.relations().object_versions_by_type_version, self.version())
            .filter_map(|v| graph.object_version(v))
            .collect()
    }

    /// Op-versions whose sampled call takes an object of this type.
    pub fn input_to(&self) -> Vec<OpVersion<'g>> {
        let graph = self.graph;
        members(&graph.relations().type_input_to, self.version())
            .filter_map(|v| graph.op_version(v))
            .collect()
    }

    /// Op-versions whose sampled call produces an object of this type.
    pub fn output_from(&self) -> Vec<OpVersion<'g>> {
        let graph = self.graph;
        members(&graph.relations().type_output_from, self.version())
            .filter_map(|v| graph.op_version(v))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Ops

#[derive(Clone, Copy)]
pub struct Op<'g> {
    graph: &'g ProjectGraph,
    name: &'g str,
}

identity!(Op, name);

impl<'g> Op<'g> {
    pub(crate) fn new(graph: &'g ProjectGraph, name: &'g str) -> Self {
        Self { graph, name }
    }

    pub fn name(&self) -> &'g str {
        self.name
    }

    pub fn op_versions(&self) -> Vec<OpVersion<'g>> {
        let graph = self.graph;
        members(&graph.relations().op_versions_by_op, self.name)
            .filter_map(|v| graph.op_version(v))
            .collect()
    }

    pub fn category(&self) -> Option<OpCategory> {
        classify_op_category(self.name)
    }
}

#[derive(Clone, Copy)]
pub struct OpVersion<'g> {
    graph: &'g ProjectGraph,
    entry: &'g OpVersionEntry,
}

identity!(OpVersion, version);

impl<'g> OpVersion<'g> {
    pub(crate) fn new(graph: &'g ProjectGraph, entry: &'g OpVersionEntry) -> Self {
        Self { graph, entry }
    }

    pub fn version(&self) -> &'g str {
        &self.entry.version
    }

    pub fn op_name(&self) -> &'g str {
        &self.entry.op_name
    }

    pub fn op(&self) -> Op<'g> {
        Op::new(self.graph, &self.entry.op_name)
    }

    pub fn created_at_ms(&self) -> i64 {
        self.entry.created_at_ms
    }

    pub fn aliases(&self) -> &'g [String] {
        &self.entry.aliases
    }

    pub fn description(&self) -> Option<&'g str> {
        self.entry.description.as_deref()
    }

    pub fn version_index(&self) -> u64 {
        self.entry.version_index
    }

    pub fn category(&self) -> Option<OpCategory> {
        classify_op_category(&self.entry.op_name)
    }

    pub fn ref_uri(&self) -> RefUri {
        ref_uri(self.graph, &self.entry.op_name, &self.entry.version)
    }

    pub fn calls(&self) -> Vec<Call<'g>> {
        let graph = self.graph;
        members(&graph.relations().calls_by_op_version, self.version())
            .filter_map(|id| graph.call(id))
            .collect()
    }

    /// The one call `invokes` and the type sets are sampled from.
    pub fn example_call(&self) -> Option<Call<'g>> {
        let id = self.graph.relations().example_call.get(self.version())?;
        self.graph.call(id)
    }

    /// Op-versions called directly by the example call. Other calls of this
    /// op-version may call different things.
    pub fn invokes(&self) -> Vec<OpVersion<'g>> {
        let graph = self.graph;
        members(&graph.relations().invokes, self.version())
            .filter_map(|v| graph.op_version(v))
            .collect()
    }

    pub fn invoked_by(&self) -> Vec<OpVersion<'g>> {
        let graph = self.graph;
        members(&graph.relations().invoked_by, self.version())
            .filter_map(|v| graph.op_version(v))
            .collect()
    }

    pub fn input_type_versions(&self) -> Vec<TypeVersion<'g>> {
        let graph = self.graph;
        members(&graph.relations().input_type_versions, self.version())
            .filter_map(|v| graph.type_version(v))
            .collect()
    }

    pub fn output_type_versions(&self) -> Vec<TypeVersion<'g>> {
        let graph = self.graph;
        members(&graph.relations().output_type_versions, self.version())
            .filter_map(|v| graph.type_version(v))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Objects

#[derive(Clone, Copy)]
pub struct Object<'g> {
    graph: &'g ProjectGraph,
    name: &'g str,
}

identity!(Object, name);

impl<'g> Object<'g> {
    pub(crate) fn new(graph: &'g ProjectGraph, name: &'g str) -> Self {
        Self { graph, name }
    }

    pub fn name(&self) -> &'g str {
        self.name
    }

    pub fn object_versions(&self) -> Vec<ObjectVersion<'g>> {
        let graph = self.graph;
        members(&graph.relations().object_versions_by_object, self.name)
            .filter_map(|v| graph.object_version(v))
            .collect()
    }
}

#[derive(Clone, Copy)]
pub struct ObjectVersion<'g> {
    graph: &'g ProjectGraph,
    entry: &'g ObjectVersionEntry,
}

identity!(ObjectVersion, version);

impl<'g> ObjectVersion<'g> {
    pub(crate) fn new(graph: &'g ProjectGraph, entry: &'g ObjectVersionEntry) -> Self {
        Self { graph, entry }
    }

    pub fn version(&self) -> &'g str {
        &self.entry.version
    }

    pub fn object_name(&self) -> &'g str {
        &self.entry.object_name
    }

    pub fn object(&self) -> Object<'g> {
        Object::new(self.graph, &self.entry.object_name)
    }

    pub fn created_at_ms(&self) -> i64 {
        self.entry.created_at_ms
    }

    pub fn aliases(&self) -> &'g [String] {
        &self.entry.aliases
    }

    pub fn description(&self) -> Option<&'g str> {
        self.entry.description.as_deref()
    }

    pub fn version_index(&self) -> u64 {
        self.entry.version_index
    }

    pub fn type_version(&self) -> Option<TypeVersion<'g>> {
        self.graph.type_version(&self.entry.type_version)
    }

    pub fn ref_uri(&self) -> RefUri {
        ref_uri(self.graph, &self.entry.object_name, &self.entry.version)
    }

    pub fn input_to(&self) -> Vec<Call<'g>> {
        let graph = self.graph;
        members(&graph.relations().object_input_to, self.version())
            .filter_map(|id| graph.call(id))
            .collect()
    }

    pub fn output_from(&self) -> Vec<Call<'g>> {
        let graph = self.graph;
        members(&graph.relations().object_output_from, self.version())
            .filter_map(|id| graph.call(id))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Calls

#[derive(Clone, Copy)]
pub struct Call<'g> {
    graph: &'g ProjectGraph,
    entry: &'g CallEntry,
}

identity!(Call, id);

impl<'g> Call<'g> {
    pub(crate) fn new(graph: &'g ProjectGraph, entry: &'g CallEntry) -> Self {
        Self { graph, entry }
    }

    pub fn id(&self) -> &'g str {
        &self.entry.span_id
    }

    pub fn trace_id(&self) -> &'g str {
        &self.entry.trace_id
    }

    /// Parent span id as recorded, whether or not that span is in the batch.
    pub fn parent_id(&self) -> Option<&'g str> {
        self.entry.parent_id.as_deref()
    }

    pub fn name(&self) -> &'g str {
        &self.entry.name
    }

    pub fn op_version(&self) -> Option<OpVersion<'g>> {
        self.graph.op_version(self.entry.op_version.as_deref()?)
    }

    pub fn inputs(&self) -> Vec<ObjectVersion<'g>> {
        self.entry
            .inputs
            .iter()
            .filter_map(|v| self.graph.object_version(v))
            .collect()
    }

    pub fn outputs(&self) -> Vec<ObjectVersion<'g>> {
        self.entry
            .outputs
            .iter()
            .filter_map(|v| self.graph.object_version(v))
            .collect()
    }

    pub fn parent_call(&self) -> Option<Call<'g>> {
        self.graph.call(self.entry.parent_id.as_deref()?)
    }

    pub fn child_calls(&self) -> Vec<Call<'g>> {
        let graph = self.graph;
        members(&graph.relations().child_calls, self.id())
            .filter_map(|id| graph.call(id))
            .collect()
    }

    pub fn is_trace_root(&self) -> bool {
        self.parent_call().is_none()
    }

    pub fn raw_inputs(&self) -> &'g Map<String, Value> {
        &self.entry.raw_inputs
    }

    pub fn raw_output(&self) -> &'g Value {
        &self.entry.raw_output
    }

    pub fn attributes(&self) -> &'g Map<String, Value> {
        &self.entry.attributes
    }

    pub fn summary(&self) -> &'g Map<String, Value> {
        &self.entry.summary
    }

    pub fn status_code(&self) -> Option<&'g str> {
        self.entry.status_code.as_deref()
    }

    pub fn timestamp(&self) -> Option<&'g str> {
        self.entry.timestamp.as_deref()
    }

    /// Feedback joined on by span id; empty when there is none.
    pub fn feedback(&self) -> &'g [FeedbackRecord] {
        &self.entry.feedback
    }
}
