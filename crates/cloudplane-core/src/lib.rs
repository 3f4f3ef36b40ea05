//! Cloudplane core types
//!
//! The provider-agnostic vocabulary shared by every other crate: the closed
//! set of resource kinds, their input/output schemas, desired-state
//! descriptors, and the reference expressions that link descriptors into a
//! graph.

pub mod descriptor;
pub mod error;
pub mod kind;
pub mod schema;
pub mod validate;

// Re-exports
pub use descriptor::{InputValue, Reference, ResourceDescriptor};
pub use error::{CoreError, Result, Violation};
pub use kind::{ResourceKind, RESOURCE_KINDS};
pub use schema::{FieldSpec, FieldType, ResourceSchema};
pub use validate::validate;
