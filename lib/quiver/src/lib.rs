//! quiver: a graph database over the RDF quad data model.
//!
//! Quads go in through a [`graph::QuadWriter`], persist in a pluggable
//! [`graph::QuadStore`], and come back out through path-shaped queries: a
//! [`path::Path`] describes a traversal, lowers to a tree of lazy set
//! iterators, and results are pulled from the tree's root. The [`schema`]
//! layer maps typed records onto subgraphs in both directions.
//!
//! ```
//! use quiver::{new_memory_graph, start_path, triple};
//! use quiver::model::iri;
//! use quiver::graph::QueryContext;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut h = new_memory_graph();
//! h.write([
//!     triple(iri("alice"), iri("follows"), iri("bob")),
//!     triple(iri("bob"), iri("follows"), iri("carol")),
//! ])?;
//!
//! let ctx = QueryContext::background();
//! let p = start_path([iri("alice")]).out([iri("follows")]);
//! let mut it = p.build_iterator_optimized(h.quad_store())?;
//! assert!(it.next(&ctx));
//! let bob = h.quad_store().name_of(&it.result().unwrap());
//! assert_eq!(bob, Some(iri("bob")));
//! # Ok(())
//! # }
//! ```

mod handle;

pub use handle::{new_memory_graph, Handle};
pub use quiver_path::{start_morphism, start_path};

pub mod graph {
    pub use quiver_graph::*;
}

pub mod memstore {
    pub use quiver_memstore::*;
}

pub mod model {
    pub use quiver_model::*;
}

pub mod path {
    pub use quiver_path::*;
}

pub mod schema {
    pub use quiver_schema::*;
}

use quiver_model::{Quad, Value};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A quad without a graph label.
pub fn triple(
    subject: impl Into<Value>,
    predicate: impl Into<Value>,
    object: impl Into<Value>,
) -> Quad {
    Quad::triple(subject, predicate, object)
}

/// A quad with an optional graph label.
pub fn quad(
    subject: impl Into<Value>,
    predicate: impl Into<Value>,
    object: impl Into<Value>,
    label: Option<Value>,
) -> Quad {
    Quad::new(subject, predicate, object, label)
}
