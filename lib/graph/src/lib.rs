//! QuadStore contract and the iterator algebra of the quiver graph database.
//!
//! Everything a query turns into is a tree of lazy set generators over node
//! references ([`Ref`]); the tree is built against an abstract [`QuadStore`]
//! and driven by repeatedly advancing its root. See the [`iterate`] module
//! for the algebra itself.

mod context;
mod error;
mod quadstore;
mod refs;

pub mod graphmock;
pub mod iterate;

pub use context::{CancelHandle, QueryContext, QueryError};
pub use error::StoreError;
pub use quadstore::{QuadStore, QuadWriter, StoreRef, StoreStats};
pub use refs::Ref;
