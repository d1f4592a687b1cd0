use quiver_graph::iterate::{Iterator, Kind, Size, Stats, TagMap, Tagger};
use quiver_graph::{QueryContext, Ref};
use std::any::Any;

/// Iterator over a snapshot of interned ids: either a directional quad-index
/// range or one of the store's all-node/all-quad sets.
#[derive(Debug)]
pub struct MemIterator {
    ids: Vec<u64>,
    kind: Kind,
    index: usize,
    result: Option<Ref>,
    tagger: Tagger,
}

impl MemIterator {
    pub(crate) fn new(ids: Vec<u64>, kind: Kind) -> Self {
        MemIterator {
            ids,
            kind,
            index: 0,
            result: None,
            tagger: Tagger::default(),
        }
    }
}

impl Iterator for MemIterator {
    fn kind(&self) -> Kind {
        self.kind
    }

    fn next(&mut self, _ctx: &QueryContext) -> bool {
        if self.index >= self.ids.len() {
            self.result = None;
            return false;
        }
        self.result = Some(Ref::Id(self.ids[self.index]));
        self.index += 1;
        true
    }

    fn result(&self) -> Option<Ref> {
        self.result.clone()
    }

    fn next_path(&mut self, _ctx: &QueryContext) -> bool {
        false
    }

    fn contains(&mut self, _ctx: &QueryContext, v: &Ref) -> bool {
        let Some(id) = v.id() else {
            return false;
        };
        if self.ids.binary_search(&id).is_ok() {
            self.result = Some(v.clone());
            return true;
        }
        false
    }

    fn reset(&mut self) {
        self.index = 0;
        self.result = None;
    }

    fn tag_results(&self, dst: &mut TagMap) {
        if let Some(r) = &self.result {
            self.tagger.tag_result(dst, r);
        }
    }

    fn tagger(&self) -> &Tagger {
        &self.tagger
    }

    fn tagger_mut(&mut self) -> &mut Tagger {
        &mut self.tagger
    }

    fn stats(&self) -> Stats {
        Stats {
            contains_cost: 1,
            next_cost: 1,
            size: Size::exact(self.ids.len() as i64),
        }
    }

    fn optimize(self: Box<Self>) -> (Box<dyn Iterator>, bool) {
        (self, false)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
