//! Raw bootstrap records and their normalization.

pub mod normalize;
pub mod record;

pub use normalize::{JoinedCall, Normalized, NormalizedObject, TypeDescriptor, normalize};
pub use record::{Bootstrap, CallRecord, FeedbackRecord, ObjectRecord, TypeVersionRecord};
