//! In-memory reference backend for the quiver graph database.
//!
//! Values are interned to dense integer ids and quads live in an append-only
//! log with per-direction indexes, so directional traversal is an ordered
//! set lookup. Reads are safe for concurrent readers; writes serialize on an
//! internal lock.

mod iterator;
mod store;
mod writer;

pub use iterator::MemIterator;
pub use store::{store_with, MemStore};
pub use writer::MemWriter;
