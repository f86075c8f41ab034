//! Raw record shapes as the data-fetch layer hands them over.
//!
//! Object record:
//! {
//!   "collection_name": "Dataset",
//!   "hash": "abc123",
//!   "created_at_ms": 1700000000000,
//!   "aliases": ["latest"],
//!   "description": null,
//!   "version_index": 0,
//!   "type_version": {
//!     "type_name": "Dataset",
//!     "type_version": "t1",
//!     "type_version_json_string": null,   // set when type_version is "unknown"
//!     "parent_type": { ... },             // same shape, optional
//!     ...                                 // structural properties
//!   }
//! }
//!
//! Call record:
//! { "span_id", "trace_id", "parent_id", "name", "inputs": {...}, "output": ...,
//!   "attributes", "summary", "status_code", "timestamp" }
//!
//! Feedback record:
//! { "run_id", "feedback_id", "timestamp", "feedback": {...} }
//!
//! Unknown fields are ignored. Missing identity fields fail deserialization.

use crate::error::{Error, RecordKind, Result};

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectRecord {
    pub collection_name: String,

    pub hash: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at_ms: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub aliases: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub version_index: u64,

    pub type_version: TypeVersionRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeVersionRecord {
    pub type_name: String,

    pub type_version: String,

    #[serde(default)]
    pub type_version_json_string: Option<String>,

    #[serde(default)]
    pub parent_type: Option<Box<TypeVersionRecord>>,

    /// Everything else on the sub-record is the structural description.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallRecord {
    pub span_id: String,

    pub trace_id: String,

    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub inputs: Map<String, Value>,

    #[serde(default)]
    pub output: Value,

    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Map<String, Value>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: Map<String, Value>,

    #[serde(default)]
    pub status_code: Option<String>,

    #[serde(default, deserialize_with = "string_or_number")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FeedbackRecord {
    pub run_id: String,

    pub feedback_id: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub timestamp: Option<String>,

    #[serde(default)]
    pub feedback: Value,
}

/// One batch fetched for a single `(entity, project)`.
#[derive(Debug, Clone, Default)]
pub struct Bootstrap {
    pub objects: Vec<ObjectRecord>,
    pub calls: Vec<CallRecord>,
    pub feedback: Vec<FeedbackRecord>,
}

/// The batch envelope before its records are typed.
#[derive(Deserialize)]
struct Sections {
    #[serde(default)]
    objects: Vec<Value>,

    #[serde(default)]
    calls: Vec<Value>,

    #[serde(default)]
    feedback: Vec<Value>,
}

impl Bootstrap {
    pub fn new(
        objects: Vec<ObjectRecord>,
        calls: Vec<CallRecord>,
        feedback: Vec<FeedbackRecord>,
    ) -> Self {
        Self {
            objects,
            calls,
            feedback,
        }
    }

    /// Parse `{"objects": [...], "calls": [...], "feedback": [...]}`.
    ///
    /// A malformed envelope is `Error::Json`; a malformed record inside it is
    /// `Error::Record`, as with [`Bootstrap::from_values`].
    pub fn from_json_str(s: &str) -> Result<Self> {
        let sections: Sections = serde_json::from_str(s)?;
        Self::from_values(&sections.objects, &sections.calls, &sections.feedback)
    }

    /// Convert loosely typed arrays record by record, so a bad record is
    /// reported with its position.
    pub fn from_values(objects: &[Value], calls: &[Value], feedback: &[Value]) -> Result<Self> {
        Ok(Self {
            objects: records_from_values(RecordKind::Object, objects)?,
            calls: records_from_values(RecordKind::Call, calls)?,
            feedback: records_from_values(RecordKind::Feedback, feedback)?,
        })
    }
}

fn records_from_values<T: DeserializeOwned>(kind: RecordKind, values: &[Value]) -> Result<Vec<T>> {
    values
        .iter()
        .enumerate()
        .map(|(index, v)| {
            T::deserialize(v).map_err(|e| Error::record(kind, index, e.to_string()))
        })
        .collect()
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    // Backends disagree on whether timestamps are ISO strings or epoch numbers.
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "timestamp must be a string or number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn object_record_keeps_structural_properties() {
        let rec: ObjectRecord = serde_json::from_value(json!({
            "collection_name": "Dataset",
            "hash": "abc123",
            "aliases": null,
            "type_version": {
                "type_name": "Dataset",
                "type_version": "t1",
                "rows": "list"
            }
        }))
        .unwrap();
        assert!(rec.aliases.is_empty());
        assert_eq!(rec.type_version.properties.get("rows"), Some(&json!("list")));
        assert!(rec.type_version.parent_type.is_none());
    }

    #[test]
    fn call_record_tolerates_null_maps_and_numeric_timestamps() {
        let rec: CallRecord = serde_json::from_value(json!({
            "span_id": "s1",
            "trace_id": "t",
            "name": "f",
            "inputs": null,
            "timestamp": 1700000000
        }))
        .unwrap();
        assert!(rec.inputs.is_empty());
        assert_eq!(rec.output, Value::Null);
        assert_eq!(rec.timestamp.as_deref(), Some("1700000000"));
    }

    #[test]
    fn from_values_reports_position_of_bad_record() {
        let calls = vec![
            json!({"span_id": "s1", "trace_id": "t"}),
            json!({"trace_id": "t"}),
        ];
        let err = Bootstrap::from_values(&[], &calls, &[]).unwrap_err();
        match err {
            Error::Record { kind, index, reason } => {
                assert_eq!(kind, RecordKind::Call);
                assert_eq!(index, 1);
                assert!(reason.contains("span_id"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn null_counters_fall_back_to_zero() {
        let rec: ObjectRecord = serde_json::from_value(json!({
            "collection_name": "Dataset",
            "hash": "abc123",
            "created_at_ms": null,
            "version_index": null,
            "type_version": {"type_name": "Dataset", "type_version": "t1"}
        }))
        .unwrap();
        assert_eq!(rec.created_at_ms, 0);
        assert_eq!(rec.version_index, 0);
    }

    #[test]
    fn json_batch_reports_bad_record_by_position() {
        let err = Bootstrap::from_json_str(
            r#"{"objects": [{"collection_name": "ds", "type_version": {"type_name": "T", "type_version": "t1"}}]}"#,
        )
        .unwrap_err();
        match err {
            Error::Record { kind, index, reason } => {
                assert_eq!(kind, RecordKind::Object);
                assert_eq!(index, 0);
                assert!(reason.contains("hash"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            Bootstrap::from_json_str("[1, 2]").unwrap_err(),
            Error::Json(_)
        ));
    }

    #[test]
    fn bootstrap_sections_default_to_empty() {
        let b = Bootstrap::from_json_str(r#"{"calls": []}"#).unwrap();
        assert!(b.objects.is_empty());
        assert!(b.feedback.is_empty());
    }
}
