//! Wire shapes for load and save requests.
//!
//! These mirror the JSON bodies exchanged with API clients and forwarded to
//! the executor. Unknown keys on operation models, fields and conditions are
//! kept in `extra` maps and passed through untouched; only the keys the engine
//! rewrites are modelled explicitly.

pub mod condition;
pub mod field;
pub mod load;
pub mod metadata;
pub mod save;

pub use condition::ConditionSpec;
pub use field::{FieldRequest, FieldSpec, RELATIONSHIP_MARKER};
pub use load::{LoadOptions, LoadRequest, OperationModel, RegulatedLoad};
pub use metadata::{EntityMetadata, FieldMetadata};
pub use save::{RegulatedSave, SaveOperation, SaveRequest};
