//! A mock [`QuadStore`] over a plain quad list.
//!
//! Gives the algebra's unit and property tests a store with predictable
//! contents and no backend machinery. Lookups are linear scans; node ids
//! count from one and quad ids live above a high base offset.

use crate::iterate::{Fixed, Iterator};
use crate::{QuadStore, Ref, StoreRef, StoreStats};
use quiver_model::{Direction, Quad, Value};
use std::sync::Arc;

const QUAD_ID_BASE: u64 = 1 << 32;

#[derive(Debug, Default)]
pub struct GraphMock {
    values: Vec<Value>,
    quads: Vec<Quad>,
}

impl GraphMock {
    pub fn new(quads: impl IntoIterator<Item = Quad>) -> Self {
        let mut store = GraphMock::default();
        for q in quads {
            store.add(q);
        }
        store
    }

    /// A shared handle, ready to hand to iterators.
    pub fn shared(quads: impl IntoIterator<Item = Quad>) -> StoreRef {
        Arc::new(GraphMock::new(quads))
    }

    pub fn add(&mut self, q: Quad) {
        for d in Direction::ALL {
            if let Some(v) = q.get(d) {
                if !self.values.contains(v) {
                    self.values.push(v.clone());
                }
            }
        }
        self.quads.push(q);
    }
}

impl QuadStore for GraphMock {
    fn value_of(&self, v: &Value) -> Option<Ref> {
        self.values
            .iter()
            .position(|x| x == v)
            .map(|i| Ref::Id(i as u64 + 1))
    }

    fn name_of(&self, r: &Ref) -> Option<Value> {
        match r {
            Ref::PreFetched(v) => Some(v.clone()),
            Ref::Id(id) if *id < QUAD_ID_BASE => {
                self.values.get((*id as usize).checked_sub(1)?).cloned()
            }
            _ => None,
        }
    }

    fn quad(&self, r: &Ref) -> Option<Quad> {
        let id = r.id()?;
        self.quads.get(id.checked_sub(QUAD_ID_BASE)? as usize).cloned()
    }

    fn quad_direction(&self, r: &Ref, d: Direction) -> Option<Ref> {
        let q = self.quad(r)?;
        self.value_of(q.get(d)?)
    }

    fn quad_iterator(&self, d: Direction, r: &Ref) -> Box<dyn Iterator> {
        let Some(name) = self.name_of(r) else {
            return Box::new(Fixed::new(Vec::new()));
        };
        let refs = self
            .quads
            .iter()
            .enumerate()
            .filter(|(_, q)| q.get(d) == Some(&name))
            .map(|(i, _)| Ref::Id(QUAD_ID_BASE + i as u64))
            .collect();
        Box::new(Fixed::new(refs))
    }

    fn nodes_all_iterator(&self) -> Box<dyn Iterator> {
        Box::new(Fixed::new(
            (0..self.values.len())
                .map(|i| Ref::Id(i as u64 + 1))
                .collect(),
        ))
    }

    fn quads_all_iterator(&self) -> Box<dyn Iterator> {
        Box::new(Fixed::new(
            (0..self.quads.len())
                .map(|i| Ref::Id(QUAD_ID_BASE + i as u64))
                .collect(),
        ))
    }

    fn stats(&self) -> StoreStats {
        StoreStats {
            nodes: self.values.len() as i64,
            quads: self.quads.len() as i64,
        }
    }
}
