//! Structural type descriptions.
//!
//! A type description is either a leaf tag ("int", "str", ...) or a map from
//! property name to a nested description. Arbitrary JSON is folded into that
//! shape by [`TypeTree::from_value`], which never fails.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeTree {
    Leaf(String),
    Node(BTreeMap<String, TypeTree>),
}

impl TypeTree {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => TypeTree::Leaf(s.clone()),
            Value::Object(map) => TypeTree::Node(
                map.iter()
                    .map(|(k, v)| (k.clone(), TypeTree::from_value(v)))
                    .collect(),
            ),
            // Lists become index-keyed nodes so member order survives.
            Value::Array(items) => TypeTree::Node(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), TypeTree::from_value(v)))
                    .collect(),
            ),
            other => TypeTree::Leaf(other.to_string()),
        }
    }

    pub fn empty() -> Self {
        TypeTree::Node(BTreeMap::new())
    }

    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            TypeTree::Leaf(s) => Some(s),
            TypeTree::Node(_) => None,
        }
    }

    /// Property lookup on a node; leaves have no properties.
    pub fn property(&self, name: &str) -> Option<&TypeTree> {
        match self {
            TypeTree::Leaf(_) => None,
            TypeTree::Node(props) => props.get(name),
        }
    }

    pub fn property_names(&self) -> Vec<&str> {
        match self {
            TypeTree::Leaf(_) => Vec::new(),
            TypeTree::Node(props) => props.keys().map(String::as_str).collect(),
        }
    }
}

impl Default for TypeTree {
    fn default() -> Self {
        TypeTree::empty()
    }
}
