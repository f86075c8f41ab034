//! Build configuration and project scope.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const OP_DEF_TYPE: &str = "OpDef";
pub const STREAM_TABLE_TYPE: &str = "stream_table";
pub const TYPE_TYPE: &str = "type";
pub const UNKNOWN_TYPE: &str = "unknown";

/// The `(entity, project)` pair every entity in a graph belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectScope {
    pub entity: String,
    pub project: String,
}

impl ProjectScope {
    pub fn new(entity: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            project: project.into(),
        }
    }
}

/// Names the builder treats specially when partitioning object records.
///
/// JSON shape (every field optional):
/// {
///   "op_def_type": "OpDef",
///   "reserved_types": ["OpDef", "stream_table", "type"],
///   "unknown_sentinel": "unknown"
/// }
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Object records of this type become op-versions.
    pub op_def_type: String,

    /// Object records of these types never become object-versions.
    pub reserved_types: BTreeSet<String>,

    /// Marks a type-version sub-record whose real shape is JSON-encoded.
    pub unknown_sentinel: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            op_def_type: OP_DEF_TYPE.to_string(),
            reserved_types: [OP_DEF_TYPE, STREAM_TABLE_TYPE, TYPE_TYPE]
                .into_iter()
                .map(str::to_string)
                .collect(),
            unknown_sentinel: UNKNOWN_TYPE.to_string(),
        }
    }
}

impl BuildConfig {
    pub fn is_op_def(&self, type_name: &str) -> bool {
        type_name == self.op_def_type
    }

    pub fn is_reserved(&self, type_name: &str) -> bool {
        self.reserved_types.contains(type_name)
    }
}
