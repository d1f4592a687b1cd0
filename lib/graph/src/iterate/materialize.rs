use crate::context::QueryContext;
use crate::error::StoreError;
use crate::iterate::{Iterator, Kind, Size, Stats, TagMap, Tagger};
use crate::refs::Ref;
use std::any::Any;
use std::collections::HashMap;

/// Abort materialization beyond this many entries and fall back to the
/// wrapped iterator.
const MATERIALIZE_LIMIT: usize = 1000;

#[derive(Debug, Clone)]
struct Entry {
    result: Ref,
    tags: TagMap,
}

/// Buffers the child's full result set (with tag bindings) on first use, so
/// repeated resets and membership checks become cheap.
///
/// Result sets larger than [`MATERIALIZE_LIMIT`] are not buffered; the
/// iterator then behaves as a plain passthrough.
#[derive(Debug)]
pub struct Materialize {
    child: Box<dyn Iterator>,
    // groups of entries; each group is one result plus its alternative paths
    values: Vec<Vec<Entry>>,
    index: HashMap<Ref, usize>,
    cur: usize,
    cur_path: usize,
    state: State,
    tagger: Tagger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Pending,
    Materialized,
    Lossy,
}

impl Materialize {
    pub fn new(child: Box<dyn Iterator>) -> Self {
        Materialize {
            child,
            values: Vec::new(),
            index: HashMap::new(),
            cur: 0,
            cur_path: 0,
            state: State::Pending,
            tagger: Tagger::default(),
        }
    }

    fn materialize(&mut self, ctx: &QueryContext) {
        if self.state != State::Pending {
            return;
        }
        let mut total = 0usize;
        while self.child.next(ctx) {
            let Some(r) = self.child.result() else {
                continue;
            };
            let mut tags = TagMap::new();
            self.child.tag_results(&mut tags);
            let mut group = vec![Entry {
                result: r.clone(),
                tags,
            }];
            while self.child.next_path(ctx) {
                let mut tags = TagMap::new();
                self.child.tag_results(&mut tags);
                group.push(Entry {
                    result: r.clone(),
                    tags,
                });
            }
            total += group.len();
            if total > MATERIALIZE_LIMIT {
                tracing::debug!(limit = MATERIALIZE_LIMIT, "result set too large to buffer");
                self.values.clear();
                self.index.clear();
                self.state = State::Lossy;
                self.child.reset();
                return;
            }
            self.index.entry(r).or_insert(self.values.len());
            self.values.push(group);
        }
        if self.child.err().is_some() {
            // do not trust a partial buffer
            self.values.clear();
            self.index.clear();
            self.state = State::Lossy;
            return;
        }
        self.state = State::Materialized;
        // cur is 1-based over values so 0 can mean "before the first result"
        self.cur = 0;
        self.cur_path = 0;
    }
}

impl Iterator for Materialize {
    fn kind(&self) -> Kind {
        Kind::Materialize
    }

    fn next(&mut self, ctx: &QueryContext) -> bool {
        self.materialize(ctx);
        if self.state == State::Lossy {
            return self.child.next(ctx);
        }
        if self.cur >= self.values.len() {
            return false;
        }
        self.cur += 1;
        self.cur_path = 0;
        true
    }

    fn result(&self) -> Option<Ref> {
        if self.state == State::Lossy {
            return self.child.result();
        }
        let group = self.values.get(self.cur.checked_sub(1)?)?;
        group.get(self.cur_path).map(|e| e.result.clone())
    }

    fn next_path(&mut self, ctx: &QueryContext) -> bool {
        if self.state == State::Lossy {
            return self.child.next_path(ctx);
        }
        let Some(group) = self.cur.checked_sub(1).and_then(|i| self.values.get(i)) else {
            return false;
        };
        if self.cur_path + 1 < group.len() {
            self.cur_path += 1;
            return true;
        }
        false
    }

    fn contains(&mut self, ctx: &QueryContext, v: &Ref) -> bool {
        self.materialize(ctx);
        if self.state == State::Lossy {
            return self.child.contains(ctx, v);
        }
        match self.index.get(v) {
            Some(&i) => {
                self.cur = i + 1;
                self.cur_path = 0;
                true
            }
            None => false,
        }
    }

    fn reset(&mut self) {
        // the buffer survives a reset; that is the point of materializing
        self.cur = 0;
        self.cur_path = 0;
        if self.state == State::Lossy {
            self.child.reset();
            self.state = State::Pending;
            self.values.clear();
            self.index.clear();
        }
    }

    fn tag_results(&self, dst: &mut TagMap) {
        if self.state == State::Lossy {
            self.child.tag_results(dst);
            return;
        }
        let Some(group) = self.cur.checked_sub(1).and_then(|i| self.values.get(i)) else {
            return;
        };
        if let Some(entry) = group.get(self.cur_path) {
            for (tag, value) in &entry.tags {
                dst.insert(tag.clone(), value.clone());
            }
            self.tagger.tag_result(dst, &entry.result);
        }
    }

    fn tagger(&self) -> &Tagger {
        &self.tagger
    }

    fn tagger_mut(&mut self) -> &mut Tagger {
        &mut self.tagger
    }

    fn stats(&self) -> Stats {
        if self.state == State::Materialized {
            Stats {
                contains_cost: 1,
                next_cost: 1,
                size: Size::exact(self.values.len() as i64),
            }
        } else {
            let child = self.child.stats();
            Stats {
                contains_cost: 1,
                next_cost: child.next_cost,
                size: child.size,
            }
        }
    }

    fn optimize(self: Box<Self>) -> (Box<dyn Iterator>, bool) {
        let this = *self;
        let Materialize { child, tagger, .. } = this;
        let (child, changed) = child.optimize();
        if child.kind() == Kind::Null || child.kind() == Kind::Fixed {
            // already cheap to reset and to contains-check
            let mut child = child;
            child.tagger_mut().copy_from(&tagger);
            return (child, true);
        }
        let mut it = Materialize::new(child);
        it.tagger = tagger;
        (Box::new(it), changed)
    }

    fn sub_iterators(&self) -> Vec<&dyn Iterator> {
        vec![self.child.as_ref()]
    }

    fn close(&mut self) -> Result<(), StoreError> {
        self.values.clear();
        self.index.clear();
        self.child.close()
    }

    fn err(&self) -> Option<&StoreError> {
        self.child.err()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
