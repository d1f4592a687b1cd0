use crate::context::QueryContext;
use crate::error::StoreError;
use crate::iterate::{Iterator, Kind, Size, Stats, TagMap, Tagger};
use crate::refs::Ref;
use std::any::Any;
use std::collections::HashSet;

const UNIQUENESS_FACTOR: i64 = 2;

/// Deduplicates the child's results by ref identity.
#[derive(Debug)]
pub struct Unique {
    child: Box<dyn Iterator>,
    seen: HashSet<Ref>,
    result: Option<Ref>,
    tagger: Tagger,
}

impl Unique {
    pub fn new(child: Box<dyn Iterator>) -> Self {
        Unique {
            child,
            seen: HashSet::new(),
            result: None,
            tagger: Tagger::default(),
        }
    }
}

impl Iterator for Unique {
    fn kind(&self) -> Kind {
        Kind::Unique
    }

    fn next(&mut self, ctx: &QueryContext) -> bool {
        while self.child.next(ctx) {
            let Some(r) = self.child.result() else {
                continue;
            };
            if self.seen.insert(r.clone()) {
                self.result = Some(r);
                return true;
            }
        }
        self.result = None;
        false
    }

    fn result(&self) -> Option<Ref> {
        self.result.clone()
    }

    fn next_path(&mut self, _ctx: &QueryContext) -> bool {
        false
    }

    fn contains(&mut self, ctx: &QueryContext, v: &Ref) -> bool {
        self.child.contains(ctx, v)
    }

    fn reset(&mut self) {
        self.child.reset();
        self.seen.clear();
        self.result = None;
    }

    fn tag_results(&self, dst: &mut TagMap) {
        if let Some(r) = &self.result {
            self.tagger.tag_result(dst, r);
        }
        self.child.tag_results(dst);
    }

    fn tagger(&self) -> &Tagger {
        &self.tagger
    }

    fn tagger_mut(&mut self) -> &mut Tagger {
        &mut self.tagger
    }

    fn stats(&self) -> Stats {
        let child = self.child.stats();
        Stats {
            contains_cost: child.contains_cost,
            next_cost: child.next_cost,
            size: Size::approx((child.size.value / UNIQUENESS_FACTOR).max(1)),
        }
    }

    fn optimize(self: Box<Self>) -> (Box<dyn Iterator>, bool) {
        let this = *self;
        let Unique { child, tagger, .. } = this;
        let (child, changed) = child.optimize();
        let mut it = Unique::new(child);
        it.tagger = tagger;
        (Box::new(it), changed)
    }

    fn sub_iterators(&self) -> Vec<&dyn Iterator> {
        vec![self.child.as_ref()]
    }

    fn close(&mut self) -> Result<(), StoreError> {
        self.seen.clear();
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterate::{drain, Fixed};

    #[test]
    fn repeated_refs_are_emitted_once() {
        let ctx = QueryContext::background();
        let child = Box::new(Fixed::new(vec![
            Ref::pre_fetched("a"),
            Ref::pre_fetched("b"),
            Ref::pre_fetched("a"),
            Ref::pre_fetched("b"),
        ]));
        let mut it = Unique::new(child);
        assert_eq!(
            drain(&ctx, &mut it),
            vec![Ref::pre_fetched("a"), Ref::pre_fetched("b")]
        );
    }
}
