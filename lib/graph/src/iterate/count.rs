use crate::context::QueryContext;
use crate::error::StoreError;
use crate::iterate::{Iterator, Kind, Size, Stats, TagMap, Tagger};
use crate::refs::Ref;
use quiver_model::Value;
use std::any::Any;

/// Emits exactly one result: the cardinality of the child's result set.
///
/// When the child's size estimate is exact it is trusted; otherwise the child
/// is drained, counting alternative paths as distinct entries.
#[derive(Debug)]
pub struct Count {
    child: Box<dyn Iterator>,
    result: Option<Ref>,
    done: bool,
    tagger: Tagger,
}

impl Count {
    pub fn new(child: Box<dyn Iterator>) -> Self {
        Count {
            child,
            result: None,
            done: false,
            tagger: Tagger::default(),
        }
    }

    fn compute(&mut self, ctx: &QueryContext) {
        let size = self.child.stats().size;
        let count = if size.exact {
            size.value
        } else {
            let mut count = 0;
            while self.child.next(ctx) {
                count += 1;
                while self.child.next_path(ctx) {
                    count += 1;
                }
            }
            count
        };
        self.result = Some(Ref::PreFetched(Value::Int(count)));
    }
}

impl Iterator for Count {
    fn kind(&self) -> Kind {
        Kind::Count
    }

    fn next(&mut self, ctx: &QueryContext) -> bool {
        if self.done {
            return false;
        }
        self.compute(ctx);
        self.done = true;
        true
    }

    fn result(&self) -> Option<Ref> {
        self.result.clone()
    }

    fn next_path(&mut self, _ctx: &QueryContext) -> bool {
        false
    }

    fn contains(&mut self, ctx: &QueryContext, v: &Ref) -> bool {
        if self.result.is_none() {
            self.compute(ctx);
            self.done = true;
        }
        self.result.as_ref() == Some(v)
    }

    fn reset(&mut self) {
        self.child.reset();
        self.result = None;
        self.done = false;
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
            size: Size::exact(1),
        }
    }

    fn optimize(self: Box<Self>) -> (Box<dyn Iterator>, bool) {
        let this = *self;
        let Count { child, tagger, .. } = this;
        let (child, changed) = child.optimize();
        let mut count = Count::new(child);
        count.tagger = tagger;
        (Box::new(count), changed)
    }

    fn sub_iterators(&self) -> Vec<&dyn Iterator> {
        vec![self.child.as_ref()]
    }

    fn close(&mut self) -> Result<(), StoreError> {
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
