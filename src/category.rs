//! Heuristic categories for ops and types.
//!
//! A name gets the first category (in catalog order) whose keyword occurs in
//! it, ignoring case. No keyword, no category.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpCategory {
    Train,
    Predict,
    Score,
    Evaluate,
    Tune,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeCategory {
    Model,
    Dataset,
}

impl OpCategory {
    /// Match order matters: "train_and_predict" is `Train`.
    pub const ALL: [OpCategory; 5] = [
        OpCategory::Train,
        OpCategory::Predict,
        OpCategory::Score,
        OpCategory::Evaluate,
        OpCategory::Tune,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OpCategory::Train => "train",
            OpCategory::Predict => "predict",
            OpCategory::Score => "score",
            OpCategory::Evaluate => "evaluate",
            OpCategory::Tune => "tune",
        }
    }
}

impl TypeCategory {
    pub const ALL: [TypeCategory; 2] = [TypeCategory::Model, TypeCategory::Dataset];

    pub fn as_str(self) -> &'static str {
        match self {
            TypeCategory::Model => "model",
            TypeCategory::Dataset => "dataset",
        }
    }
}

fn first_match<T: Copy>(name: &str, catalog: &[T], keyword: impl Fn(T) -> &'static str) -> Option<T> {
    let lowered = name.to_lowercase();
    catalog.iter().copied().find(|c| lowered.contains(keyword(*c)))
}

pub fn classify_op_category(name: &str) -> Option<OpCategory> {
    first_match(name, &OpCategory::ALL, OpCategory::as_str)
}

pub fn classify_type_category(name: &str) -> Option<TypeCategory> {
    first_match(name, &TypeCategory::ALL, TypeCategory::as_str)
}

impl fmt::Display for OpCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category: {}", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for OpCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OpCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

impl FromStr for TypeCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}
