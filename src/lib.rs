//! In-memory entity graph for experiment traces.
//!
//! Flat batches of versioned-object records, call spans and feedback are
//! normalized, registered (pass 1) and cross-linked (pass 2) into an
//! immutable [`ProjectGraph`] that answers lookups and navigation queries.

pub mod category;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod project;
pub mod raw;
pub mod refuri;
pub mod registry;
pub mod render;
pub mod resolve;
pub mod typetree;

pub use category::{OpCategory, TypeCategory, classify_op_category, classify_type_category};
pub use config::{BuildConfig, ProjectScope};
pub use error::{Error, RecordKind, Result};
pub use project::{Call, Object, ObjectVersion, Op, OpVersion, ProjectGraph, Type, TypeVersion};
pub use raw::{Bootstrap, CallRecord, FeedbackRecord, ObjectRecord, TypeVersionRecord};
pub use refuri::RefUri;
pub use typetree::TypeTree;
