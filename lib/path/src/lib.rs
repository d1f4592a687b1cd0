//! Fluent construction of graph traversals.
//!
//! A [`Path`] is an immutable, store-independent description of a traversal:
//! a sequence of operators such as "follow this predicate", "intersect with
//! that path" or "tag the current position". Building an iterator binds the
//! description to a concrete store; an unrooted path (a *morphism*) can be
//! bound many times.

mod apply;
mod error;
mod path;

pub use error::PathError;
pub use path::{start_morphism, start_path, Path};
