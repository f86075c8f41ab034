//! Pass 1: keyed registries of versions and calls.
//!
//! One linear pass over normalized records. Unversioned Types/Ops/Objects are
//! not stored here; they are views over the owning-name field of the versions
//! (see `resolve`).

use crate::config::BuildConfig;
use crate::diagnostics;
use crate::raw::{FeedbackRecord, JoinedCall, Normalized, NormalizedObject, TypeDescriptor};
use crate::refuri::{self, RefUri};
use crate::typetree::TypeTree;

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub struct TypeVersionEntry {
    pub type_name: String,
    pub version: String,
    pub parent: Option<String>,
    pub structure: TypeTree,
    pub encoded: Option<String>,
    pub unknown: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpVersionEntry {
    pub op_name: String,
    pub version: String,
    pub created_at_ms: i64,
    pub aliases: Vec<String>,
    pub description: Option<String>,
    pub version_index: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectVersionEntry {
    pub object_name: String,
    pub version: String,
    pub created_at_ms: i64,
    pub aliases: Vec<String>,
    pub description: Option<String>,
    pub version_index: u64,
    pub type_version: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallEntry {
    pub span_id: String,
    pub trace_id: String,
    pub parent_id: Option<String>,
    pub name: String,
    /// Set only when `name` decodes to a registered op-version.
    pub op_version: Option<String>,
    /// Registered object-versions referenced by top-level input values, in key order.
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub raw_inputs: Map<String, Value>,
    pub raw_output: Value,
    pub attributes: Map<String, Value>,
    pub summary: Map<String, Value>,
    pub status_code: Option<String>,
    pub timestamp: Option<String>,
    pub feedback: Vec<FeedbackRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct Registries {
    pub type_versions: BTreeMap<String, TypeVersionEntry>,
    pub op_versions: BTreeMap<String, OpVersionEntry>,
    pub object_versions: BTreeMap<String, ObjectVersionEntry>,
    pub calls: BTreeMap<String, CallEntry>,
}

impl Registries {
    /// Register every version and call in the batch.
    ///
    /// Versions are registered before calls so call references can be
    /// checked for membership. For duplicate ids the first record wins.
    pub fn build(config: &BuildConfig, normalized: Normalized) -> Self {
        let mut reg = Registries::default();

        let mut object_records: Vec<NormalizedObject> = Vec::new();
        for obj in normalized.objects {
            let type_name = obj.type_descriptor.type_name.as_str();
            if config.is_op_def(type_name) {
                reg.register_op_version(obj);
            } else if config.is_reserved(type_name) {
                trace!(hash = %obj.hash, type_name, "skipping reserved object type");
            } else {
                object_records.push(obj);
            }
        }

        for obj in object_records {
            reg.register_object_version(obj);
        }

        for call in normalized.calls {
            reg.register_call(call);
        }

        reg
    }

    fn register_op_version(&mut self, obj: NormalizedObject) {
        if self.op_versions.contains_key(&obj.hash) {
            diagnostics::warn(format!("duplicate op-version {} ignored", obj.hash));
            return;
        }
        self.op_versions.insert(
            obj.hash.clone(),
            OpVersionEntry {
                op_name: obj.collection_name,
                version: obj.hash,
                created_at_ms: obj.created_at_ms,
                aliases: obj.aliases,
                description: obj.description,
                version_index: obj.version_index,
            },
        );
    }

    fn register_object_version(&mut self, obj: NormalizedObject) {
        if self.object_versions.contains_key(&obj.hash) {
            diagnostics::warn(format!("duplicate object-version {} ignored", obj.hash));
            return;
        }
        self.register_type_chain(&obj.type_descriptor);
        self.object_versions.insert(
            obj.hash.clone(),
            ObjectVersionEntry {
                object_name: obj.collection_name,
                version: obj.hash,
                created_at_ms: obj.created_at_ms,
                aliases: obj.aliases,
                description: obj.description,
                version_index: obj.version_index,
                type_version: obj.type_descriptor.version,
            },
        );
    }

    /// Register a type-version and every ancestor it names.
    ///
    /// The whole chain is walked even past hashes already registered, and a
    /// known entry without a parent takes the first parent any record names.
    /// The resulting hierarchy does not depend on record order.
    fn register_type_chain(&mut self, desc: &TypeDescriptor) {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut next = Some(desc);
        while let Some(d) = next {
            if !seen.insert(d.version.as_str()) {
                break;
            }
            let parent = d.parent.as_ref().map(|p| p.version.clone());
            match self.type_versions.get_mut(&d.version) {
                Some(entry) => {
                    if entry.parent.is_none() {
                        entry.parent = parent;
                    }
                }
                None => {
                    self.type_versions.insert(
                        d.version.clone(),
                        TypeVersionEntry {
                            type_name: d.type_name.clone(),
                            version: d.version.clone(),
                            parent,
                            structure: d.structure.clone(),
                            encoded: d.encoded.clone(),
                            unknown: d.unknown,
                        },
                    );
                }
            }
            next = d.parent.as_deref();
        }
    }

    fn register_call(&mut self, call: JoinedCall) {
        let JoinedCall { record, feedback } = call;
        if self.calls.contains_key(&record.span_id) {
            diagnostics::warn(format!("duplicate call span {} ignored", record.span_id));
            return;
        }

        let op_version = RefUri::decode(&record.name)
            .map(|r| r.version)
            .filter(|v| self.op_versions.contains_key(v));
        if op_version.is_none() {
            trace!(span_id = %record.span_id, name = %record.name, "call op unresolved");
        }

        let inputs = self.resolve_object_refs(record.inputs.values());
        let outputs = match &record.output {
            Value::Object(map) => self.resolve_object_refs(map.values()),
            single => self.resolve_object_refs(std::iter::once(single)),
        };

        let parent_id = record.parent_id.filter(|p| !p.trim().is_empty());

        self.calls.insert(
            record.span_id.clone(),
            CallEntry {
                span_id: record.span_id,
                trace_id: record.trace_id,
                parent_id,
                name: record.name,
                op_version,
                inputs,
                outputs,
                raw_inputs: record.inputs,
                raw_output: record.output,
                attributes: record.attributes,
                summary: record.summary,
                status_code: record.status_code,
                timestamp: record.timestamp,
                feedback,
            },
        );
    }

    /// Keep values that decode to a registered object-version; first occurrence wins.
    fn resolve_object_refs<'a>(&self, values: impl Iterator<Item = &'a Value>) -> Vec<String> {
        let mut seen = BTreeSet::new();
        values
            .filter_map(refuri::decode_value)
            .map(|r| r.version)
            .filter(|v| self.object_versions.contains_key(v))
            .filter(|v| seen.insert(v.clone()))
            .collect()
    }
}
