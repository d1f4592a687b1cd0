use crate::context::QueryError;
use crate::iterate::Kind;
use std::error::Error;

/// An error related to store operations or a failing iterator tree.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Sentinel: an added quad was already present.
    #[error("quad already exists")]
    QuadExists,
    /// Sentinel: a removed quad was not present.
    #[error("quad does not exist")]
    QuadNotExist,
    /// The driving context was cancelled or expired.
    #[error(transparent)]
    Query(#[from] QueryError),
    /// A backend error decorated with the iterator that hit it.
    #[error("{kind} iterator: {source}")]
    Iterator {
        kind: Kind,
        #[source]
        source: Box<StoreError>,
    },
    /// A backend error passed through unchanged.
    #[error(transparent)]
    Other(Box<dyn Error + Send + Sync + 'static>),
}

impl StoreError {
    /// Wraps a backend error without interpreting it.
    pub fn other(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        StoreError::Other(error.into())
    }

    /// Decorates `source` with the identity of the iterator that observed it.
    pub fn in_iterator(kind: Kind, source: StoreError) -> Self {
        StoreError::Iterator {
            kind,
            source: Box::new(source),
        }
    }
}
