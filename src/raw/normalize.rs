//! Record normalization: type-descriptor repair, identity checks and the
//! feedback join.

use crate::config::BuildConfig;
use crate::diagnostics;
use crate::error::{Error, RecordKind, Result};
use crate::raw::record::{Bootstrap, CallRecord, FeedbackRecord, ObjectRecord, TypeVersionRecord};
use crate::typetree::TypeTree;

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A type-version sub-record after sentinel repair.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub type_name: String,
    pub version: String,
    pub structure: TypeTree,
    /// The JSON string the descriptor was recovered from, if it was repaired.
    pub encoded: Option<String>,
    /// Still the sentinel after normalization.
    pub unknown: bool,
    pub parent: Option<Box<TypeDescriptor>>,
}

#[derive(Debug, Clone)]
pub struct NormalizedObject {
    pub collection_name: String,
    pub hash: String,
    pub created_at_ms: i64,
    pub aliases: Vec<String>,
    pub description: Option<String>,
    pub version_index: u64,
    pub type_descriptor: TypeDescriptor,
}

/// A call span with every feedback record that annotates it.
#[derive(Debug, Clone)]
pub struct JoinedCall {
    pub record: CallRecord,
    pub feedback: Vec<FeedbackRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub objects: Vec<NormalizedObject>,
    pub calls: Vec<JoinedCall>,
}

/// Normalize a bootstrap batch.
///
/// Fails only on records without identity; bad embedded type JSON is
/// absorbed with a warning.
pub fn normalize(config: &BuildConfig, bootstrap: Bootstrap) -> Result<Normalized> {
    let Bootstrap {
        objects,
        calls,
        feedback,
    } = bootstrap;

    let mut objects_out = Vec::with_capacity(objects.len());
    for (index, obj) in objects.into_iter().enumerate() {
        objects_out.push(normalize_object(config, index, obj)?);
    }

    for (index, call) in calls.iter().enumerate() {
        check_call(index, call)?;
    }
    for (index, fb) in feedback.iter().enumerate() {
        if fb.run_id.trim().is_empty() {
            return Err(Error::record(RecordKind::Feedback, index, "run_id is empty"));
        }
    }

    Ok(Normalized {
        objects: objects_out,
        calls: join_feedback(calls, feedback),
    })
}

fn normalize_object(config: &BuildConfig, index: usize, obj: ObjectRecord) -> Result<NormalizedObject> {
    if obj.hash.trim().is_empty() {
        return Err(Error::record(RecordKind::Object, index, "hash is empty"));
    }
    if obj.collection_name.trim().is_empty() {
        return Err(Error::record(
            RecordKind::Object,
            index,
            format!("collection_name is empty (hash {})", obj.hash),
        ));
    }

    let type_descriptor = describe_type(config, obj.type_version, &obj.hash);

    Ok(NormalizedObject {
        collection_name: obj.collection_name,
        hash: obj.hash,
        created_at_ms: obj.created_at_ms,
        aliases: obj.aliases,
        description: obj.description,
        version_index: obj.version_index,
        type_descriptor,
    })
}

fn check_call(index: usize, call: &CallRecord) -> Result<()> {
    if call.span_id.trim().is_empty() {
        return Err(Error::record(RecordKind::Call, index, "span_id is empty"));
    }
    if call.trace_id.trim().is_empty() {
        return Err(Error::record(
            RecordKind::Call,
            index,
            format!("trace_id is empty (span {})", call.span_id),
        ));
    }
    Ok(())
}

/// Repair a type-version sub-record and, recursively, its parents.
fn describe_type(config: &BuildConfig, record: TypeVersionRecord, owner: &str) -> TypeDescriptor {
    let Repaired {
        record,
        structure,
        encoded,
        unknown,
    } = repair_sentinel(config, record, owner);

    let TypeVersionRecord {
        type_name,
        type_version,
        type_version_json_string,
        parent_type,
        properties,
    } = record;

    let structure = structure.unwrap_or_else(|| Value::Object(properties));
    TypeDescriptor {
        type_name,
        version: type_version,
        structure: TypeTree::from_value(&structure),
        encoded: encoded.or(type_version_json_string),
        unknown,
        parent: parent_type.map(|p| Box::new(describe_type(config, *p, owner))),
    }
}

struct Repaired {
    record: TypeVersionRecord,
    /// Structure recovered from a string that is JSON but not record-shaped.
    structure: Option<Value>,
    encoded: Option<String>,
    unknown: bool,
}

fn repair_sentinel(config: &BuildConfig, record: TypeVersionRecord, owner: &str) -> Repaired {
    let is_sentinel = record.type_version == config.unknown_sentinel;
    let encoded = match record.type_version_json_string.clone() {
        Some(encoded) if is_sentinel => encoded,
        _ => {
            return Repaired {
                record,
                structure: None,
                encoded: None,
                unknown: is_sentinel,
            };
        }
    };

    if let Ok(parsed) = serde_json::from_str::<TypeVersionRecord>(&encoded) {
        let unknown = parsed.type_version == config.unknown_sentinel;
        return Repaired {
            record: parsed,
            structure: None,
            encoded: Some(encoded),
            unknown,
        };
    }

    // Valid JSON without the record's identity fields: the whole value is
    // the structure. Name and version come from it when it carries them.
    match serde_json::from_str::<Value>(&encoded) {
        Ok(value) => {
            let mut record = record;
            if let Some(name) = string_field(&value, &["type_name", "type"]) {
                record.type_name = name;
            }
            if let Some(version) = string_field(&value, &["type_version"]) {
                record.type_version = version;
            }
            Repaired {
                record,
                structure: Some(value),
                encoded: Some(encoded),
                unknown: false,
            }
        }
        Err(e) => {
            diagnostics::warn(format!(
                "object {}: cannot parse embedded type description ({}); keeping '{}'",
                owner, e, config.unknown_sentinel
            ));
            Repaired {
                record,
                structure: None,
                encoded: None,
                unknown: true,
            }
        }
    }
}

fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

/// Attach feedback to calls by span id. Every call gets a (possibly empty) list.
fn join_feedback(calls: Vec<CallRecord>, feedback: Vec<FeedbackRecord>) -> Vec<JoinedCall> {
    let mut by_run: BTreeMap<String, Vec<FeedbackRecord>> = BTreeMap::new();
    for fb in feedback {
        by_run.entry(fb.run_id.clone()).or_default().push(fb);
    }
    for list in by_run.values_mut() {
        list.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.feedback_id.cmp(&b.feedback_id))
        });
    }

    let known: BTreeSet<&str> = calls.iter().map(|c| c.span_id.as_str()).collect();
    for run_id in by_run.keys() {
        if !known.contains(run_id.as_str()) {
            debug!(run_id = %run_id, "dropping feedback for unknown call");
        }
    }

    calls
        .into_iter()
        .map(|record| {
            // Duplicate span ids share one feedback list; pass 1 keeps the first.
            let feedback = by_run.get(&record.span_id).cloned().unwrap_or_default();
            JoinedCall { record, feedback }
        })
        .collect()
}
