use crate::error::StoreError;
use crate::iterate::Iterator;
use crate::refs::Ref;
use quiver_model::{Direction, Quad, Value};
use std::fmt;
use std::sync::Arc;

/// Node and quad counts reported by a store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub nodes: i64,
    pub quads: i64,
}

/// The abstract quad store the query engine runs against.
///
/// A store owns the mapping between [`Value`]s and its internal [`Ref`]s and
/// exposes directional quad traversal. Implementations must resolve
/// [`Ref::PreFetched`] in [`QuadStore::name_of`] by returning the carried
/// value. The read view backing the iterators returned here must stay
/// consistent for as long as those iterators are alive.
pub trait QuadStore: Send + Sync + fmt::Debug {
    /// Returns the ref for a value the store has indexed.
    fn value_of(&self, v: &Value) -> Option<Ref>;

    /// Resolves a node ref back to its value.
    fn name_of(&self, r: &Ref) -> Option<Value>;

    /// Resolves a quad ref to the full quad.
    fn quad(&self, r: &Ref) -> Option<Quad>;

    /// Projects a quad ref onto the node ref at `d`.
    fn quad_direction(&self, r: &Ref, d: Direction) -> Option<Ref>;

    /// All quads whose `d` endpoint is the node `r`.
    fn quad_iterator(&self, d: Direction, r: &Ref) -> Box<dyn Iterator>;

    /// All nodes the store knows.
    fn nodes_all_iterator(&self) -> Box<dyn Iterator>;

    /// All quads the store knows.
    fn quads_all_iterator(&self) -> Box<dyn Iterator>;

    fn stats(&self) -> StoreStats;

    /// Gives the store a chance to substitute a backend-specialized iterator.
    /// The returned flag reports whether a substitution happened.
    fn optimize_iterator(&self, it: Box<dyn Iterator>) -> (Box<dyn Iterator>, bool) {
        (it, false)
    }

    fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Shared handle to a quad store; iterator trees hold one of these.
pub type StoreRef = Arc<dyn QuadStore>;

/// Sink for quads produced by writes.
///
/// Whether duplicate adds and missing removals are idempotent is the
/// backend's decision; backends that reject them report the
/// [`StoreError::QuadExists`] / [`StoreError::QuadNotExist`] sentinels.
pub trait QuadWriter {
    fn write_quad(&mut self, q: &Quad) -> Result<(), StoreError>;

    fn write_quads(&mut self, quads: &[Quad]) -> Result<(), StoreError> {
        for q in quads {
            self.write_quad(q)?;
        }
        Ok(())
    }

    fn remove_quad(&mut self, q: &Quad) -> Result<(), StoreError>;

    fn close(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}
