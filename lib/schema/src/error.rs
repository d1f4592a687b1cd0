use quiver_graph::{QueryError, StoreError};
use quiver_model::Iri;
use quiver_path::PathError;

/// An error raised by the object-graph mapping layer.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SchemaError {
    /// A required field of a record being written has no value.
    #[error("required field is not set: {field}")]
    RequiredFieldNotSet { field: String },
    /// A loaded subgraph lacks a required field.
    #[error("required field is missing")]
    RequiredFieldMissing,
    /// No node matched the requested ids and constraints.
    #[error("not found")]
    NotFound,
    #[error("cannot convert {from} to {to}")]
    TypeConversion {
        from: &'static str,
        to: &'static str,
    },
    #[error("type is already registered: {iri}")]
    AlreadyRegistered { iri: Iri },
    /// The type schema itself is unusable, e.g. record values on a field
    /// without a nested schema.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// A deferred iterator error observed after a load.
    #[error("iteration failed: {0}")]
    Iteration(String),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Cancelled(#[from] QueryError),
}

impl SchemaError {
    /// Whether the error means "no such object" (wrong id, or constraints
    /// and required fields ruled every candidate out).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SchemaError::NotFound | SchemaError::RequiredFieldMissing
        )
    }
}
