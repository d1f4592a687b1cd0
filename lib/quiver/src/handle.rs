use quiver_graph::{QuadWriter, StoreError, StoreRef};
use quiver_memstore::MemStore;
use quiver_model::Quad;

/// A store and a writer over it, owned together.
///
/// The handle resolves the store/writer reference cycle by composition: it
/// owns both, and closing closes the writer first, then the store.
pub struct Handle {
    qs: StoreRef,
    qw: Box<dyn QuadWriter>,
}

impl Handle {
    pub fn new(qs: StoreRef, qw: Box<dyn QuadWriter>) -> Self {
        Handle { qs, qw }
    }

    pub fn quad_store(&self) -> &StoreRef {
        &self.qs
    }

    pub fn writer_mut(&mut self) -> &mut dyn QuadWriter {
        self.qw.as_mut()
    }

    pub fn write_quad(&mut self, q: &Quad) -> Result<(), StoreError> {
        self.qw.write_quad(q)
    }

    pub fn write(&mut self, quads: impl IntoIterator<Item = Quad>) -> Result<(), StoreError> {
        for q in quads {
            self.qw.write_quad(&q)?;
        }
        Ok(())
    }

    pub fn remove_quad(&mut self, q: &Quad) -> Result<(), StoreError> {
        self.qw.remove_quad(q)
    }

    /// Closes the writer, then the store. The first error wins but both are
    /// always closed.
    pub fn close(mut self) -> Result<(), StoreError> {
        let writer = self.qw.close();
        let store = self.qs.close();
        writer.and(store)
    }
}

/// An in-memory graph: a fresh [`MemStore`] with an idempotent writer.
pub fn new_memory_graph() -> Handle {
    let (store, writer) = MemStore::open();
    Handle::new(
        store,
        Box::new(writer.ignore_duplicates(true).ignore_missing(false)),
    )
}
