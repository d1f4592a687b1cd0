use crate::iterator::MemIterator;
use crate::writer::MemWriter;
use quiver_graph::iterate::{Fixed, Iterator, Kind, LinksTo};
use quiver_graph::{QuadStore, Ref, StoreRef, StoreStats};
use quiver_model::{Direction, Quad, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

/// Ids of the four value slots of an interned quad; zero means "no label".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
struct QuadIds {
    s: u64,
    p: u64,
    o: u64,
    l: u64,
}

impl QuadIds {
    fn get(&self, d: Direction) -> u64 {
        match d {
            Direction::Subject => self.s,
            Direction::Predicate => self.p,
            Direction::Object => self.o,
            Direction::Label => self.l,
        }
    }
}

#[derive(Debug)]
enum Content {
    Value(Value),
    Quad(QuadIds),
}

/// One slot of the primitive log; values and quads share the id space.
#[derive(Debug)]
struct Primitive {
    content: Content,
    live: bool,
    /// For values: the number of live quads referring to it.
    refs: usize,
}

#[derive(Debug, Default)]
struct Inner {
    prims: Vec<Primitive>,
    values: HashMap<Value, u64>,
    quads: HashMap<QuadIds, u64>,
    index: HashMap<(Direction, u64), BTreeSet<u64>>,
    live_nodes: i64,
    live_quads: i64,
}

impl Inner {
    fn id_of(&self, id: u64) -> Option<&Primitive> {
        self.prims.get((id as usize).checked_sub(1)?)
    }

    fn intern(&mut self, v: &Value) -> u64 {
        if let Some(&id) = self.values.get(v) {
            return id;
        }
        self.prims.push(Primitive {
            content: Content::Value(v.clone()),
            live: true,
            refs: 0,
        });
        let id = self.prims.len() as u64;
        self.values.insert(v.clone(), id);
        self.live_nodes += 1;
        id
    }

    fn add_ref(&mut self, id: u64) {
        if let Some(prim) = self.prims.get_mut(id as usize - 1) {
            prim.refs += 1;
        }
    }

    fn remove_ref(&mut self, id: u64) {
        let Some(prim) = self.prims.get_mut(id as usize - 1) else {
            return;
        };
        prim.refs = prim.refs.saturating_sub(1);
        if prim.refs == 0 {
            prim.live = false;
            self.live_nodes -= 1;
            if let Content::Value(v) = &prim.content {
                let v = v.clone();
                self.values.remove(&v);
            }
        }
    }

    fn quad_ids(&mut self, q: &Quad) -> QuadIds {
        QuadIds {
            s: self.intern(&q.subject),
            p: self.intern(&q.predicate),
            o: self.intern(&q.object),
            l: q.label.as_ref().map_or(0, |l| self.intern(l)),
        }
    }

    fn lookup_quad_ids(&self, q: &Quad) -> Option<QuadIds> {
        let l = match &q.label {
            Some(l) => *self.values.get(l)?,
            None => 0,
        };
        Some(QuadIds {
            s: *self.values.get(&q.subject)?,
            p: *self.values.get(&q.predicate)?,
            o: *self.values.get(&q.object)?,
            l,
        })
    }
}

/// An in-memory [`QuadStore`].
#[derive(Debug, Default)]
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore::default()
    }

    /// A shared store plus a writer over it.
    pub fn open() -> (Arc<MemStore>, MemWriter) {
        let store = Arc::new(MemStore::new());
        let writer = MemWriter::new(store.clone());
        (store, writer)
    }

    /// Adds a quad. Returns `false` if the quad was already present.
    pub fn add_quad(&self, q: &Quad) -> bool {
        let mut inner = self.inner.write().unwrap();
        let ids = inner.quad_ids(q);
        if let Some(&qid) = inner.quads.get(&ids) {
            if inner.id_of(qid).is_some_and(|p| p.live) {
                return false;
            }
        }
        inner.prims.push(Primitive {
            content: Content::Quad(ids),
            live: true,
            refs: 0,
        });
        let qid = inner.prims.len() as u64;
        inner.quads.insert(ids, qid);
        for d in Direction::ALL {
            let id = ids.get(d);
            if id == 0 {
                continue;
            }
            inner.add_ref(id);
            inner.index.entry((d, id)).or_default().insert(qid);
        }
        inner.live_quads += 1;
        tracing::trace!(quad = %q, "added quad");
        true
    }

    /// Removes a quad. Returns `false` if the quad was not present.
    pub fn remove_quad(&self, q: &Quad) -> bool {
        let mut inner = self.inner.write().unwrap();
        let Some(ids) = inner.lookup_quad_ids(q) else {
            return false;
        };
        let Some(&qid) = inner.quads.get(&ids) else {
            return false;
        };
        if !inner.id_of(qid).is_some_and(|p| p.live) {
            return false;
        }
        inner.prims[qid as usize - 1].live = false;
        inner.quads.remove(&ids);
        for d in Direction::ALL {
            let id = ids.get(d);
            if id == 0 {
                continue;
            }
            if let Some(set) = inner.index.get_mut(&(d, id)) {
                set.remove(&qid);
            }
            inner.remove_ref(id);
        }
        inner.live_quads -= 1;
        tracing::trace!(quad = %q, "removed quad");
        true
    }

    /// The number of live quads.
    pub fn size(&self) -> i64 {
        self.inner.read().unwrap().live_quads
    }
}

impl QuadStore for MemStore {
    fn value_of(&self, v: &Value) -> Option<Ref> {
        let inner = self.inner.read().unwrap();
        inner.values.get(v).map(|&id| Ref::Id(id))
    }

    fn name_of(&self, r: &Ref) -> Option<Value> {
        match r {
            Ref::PreFetched(v) => Some(v.clone()),
            Ref::Id(id) => {
                let inner = self.inner.read().unwrap();
                match inner.id_of(*id) {
                    Some(Primitive {
                        content: Content::Value(v),
                        ..
                    }) => Some(v.clone()),
                    _ => None,
                }
            }
            Ref::Key(_) => None,
        }
    }

    fn quad(&self, r: &Ref) -> Option<Quad> {
        let id = r.id()?;
        let inner = self.inner.read().unwrap();
        let ids = match inner.id_of(id)? {
            Primitive {
                content: Content::Quad(ids),
                ..
            } => *ids,
            _ => return None,
        };
        let value = |vid: u64| -> Option<Value> {
            match inner.id_of(vid)? {
                Primitive {
                    content: Content::Value(v),
                    ..
                } => Some(v.clone()),
                _ => None,
            }
        };
        Some(Quad {
            subject: value(ids.s)?,
            predicate: value(ids.p)?,
            object: value(ids.o)?,
            label: if ids.l == 0 { None } else { value(ids.l) },
        })
    }

    fn quad_direction(&self, r: &Ref, d: Direction) -> Option<Ref> {
        let id = r.id()?;
        let inner = self.inner.read().unwrap();
        match inner.id_of(id)? {
            Primitive {
                content: Content::Quad(ids),
                ..
            } => {
                let vid = ids.get(d);
                if vid == 0 {
                    None
                } else {
                    Some(Ref::Id(vid))
                }
            }
            _ => None,
        }
    }

    fn quad_iterator(&self, d: Direction, r: &Ref) -> Box<dyn Iterator> {
        let Some(id) = r.id() else {
            return Box::new(MemIterator::new(Vec::new(), Kind::Custom("memstore")));
        };
        let inner = self.inner.read().unwrap();
        let ids = inner
            .index
            .get(&(d, id))
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        Box::new(MemIterator::new(ids, Kind::Custom("memstore")))
    }

    fn nodes_all_iterator(&self) -> Box<dyn Iterator> {
        let inner = self.inner.read().unwrap();
        let ids = inner
            .prims
            .iter()
            .enumerate()
            .filter(|(_, p)| p.live && matches!(p.content, Content::Value(_)))
            .map(|(i, _)| i as u64 + 1)
            .collect();
        Box::new(MemIterator::new(ids, Kind::All))
    }

    fn quads_all_iterator(&self) -> Box<dyn Iterator> {
        let inner = self.inner.read().unwrap();
        let ids = inner
            .prims
            .iter()
            .enumerate()
            .filter(|(_, p)| p.live && matches!(p.content, Content::Quad(_)))
            .map(|(i, _)| i as u64 + 1)
            .collect();
        Box::new(MemIterator::new(ids, Kind::All))
    }

    fn stats(&self) -> StoreStats {
        let inner = self.inner.read().unwrap();
        StoreStats {
            nodes: inner.live_nodes,
            quads: inner.live_quads,
        }
    }

    fn optimize_iterator(&self, it: Box<dyn Iterator>) -> (Box<dyn Iterator>, bool) {
        // a links-to over a single fixed node is exactly a quad-index lookup
        if it.kind() == Kind::LinksTo && it.tagger().is_empty() {
            if let Some(links) = it.as_any().downcast_ref::<LinksTo>() {
                let subs = it.sub_iterators();
                if let Some(fixed) = subs
                    .first()
                    .and_then(|sub| sub.as_any().downcast_ref::<Fixed>())
                {
                    if fixed.values().len() == 1 && fixed.tagger().is_empty() {
                        let dir = links.direction();
                        let replacement = self.quad_iterator(dir, &fixed.values()[0]);
                        return (replacement, true);
                    }
                }
            }
        }
        (it, false)
    }
}

/// Convenience constructor used by tests and the facade: a store pre-loaded
/// with quads.
pub fn store_with(quads: impl IntoIterator<Item = Quad>) -> StoreRef {
    let store = MemStore::new();
    for q in quads {
        store.add_quad(&q);
    }
    Arc::new(store)
}
