use crate::store::MemStore;
use quiver_graph::{QuadWriter, StoreError};
use quiver_model::Quad;
use std::sync::Arc;

/// Writer over a [`MemStore`].
///
/// By default duplicate adds and missing removals surface the
/// [`StoreError::QuadExists`] / [`StoreError::QuadNotExist`] sentinels; both
/// can be downgraded to no-ops.
#[derive(Debug)]
pub struct MemWriter {
    store: Arc<MemStore>,
    ignore_duplicates: bool,
    ignore_missing: bool,
}

impl MemWriter {
    pub fn new(store: Arc<MemStore>) -> Self {
        MemWriter {
            store,
            ignore_duplicates: false,
            ignore_missing: false,
        }
    }

    pub fn ignore_duplicates(mut self, ignore: bool) -> Self {
        self.ignore_duplicates = ignore;
        self
    }

    pub fn ignore_missing(mut self, ignore: bool) -> Self {
        self.ignore_missing = ignore;
        self
    }
}

impl QuadWriter for MemWriter {
    fn write_quad(&mut self, q: &Quad) -> Result<(), StoreError> {
        if !self.store.add_quad(q) && !self.ignore_duplicates {
            return Err(StoreError::QuadExists);
        }
        Ok(())
    }

    fn remove_quad(&mut self, q: &Quad) -> Result<(), StoreError> {
        if !self.store.remove_quad(q) && !self.ignore_missing {
            return Err(StoreError::QuadNotExist);
        }
        Ok(())
    }
}
