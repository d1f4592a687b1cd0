use crate::context::QueryContext;
use crate::error::StoreError;
use crate::iterate::{Iterator, Kind, Size, Stats, TagMap, Tagger};
use crate::refs::Ref;
use std::any::Any;

/// Passthrough that discards the first `skip` results encountered.
#[derive(Debug)]
pub struct Skip {
    child: Box<dyn Iterator>,
    skip: i64,
    skipped: i64,
    tagger: Tagger,
}

impl Skip {
    pub fn new(child: Box<dyn Iterator>, skip: i64) -> Self {
        Skip {
            child,
            skip,
            skipped: 0,
            tagger: Tagger::default(),
        }
    }
}

impl Iterator for Skip {
    fn kind(&self) -> Kind {
        Kind::Skip
    }

    fn next(&mut self, ctx: &QueryContext) -> bool {
        while self.skipped < self.skip {
            if !self.child.next(ctx) {
                return false;
            }
            self.skipped += 1;
        }
        self.child.next(ctx)
    }

    fn result(&self) -> Option<Ref> {
        self.child.result()
    }

    fn next_path(&mut self, ctx: &QueryContext) -> bool {
        self.child.next_path(ctx)
    }

    fn contains(&mut self, ctx: &QueryContext, v: &Ref) -> bool {
        self.child.contains(ctx, v)
    }

    fn reset(&mut self) {
        self.child.reset();
        self.skipped = 0;
    }

    fn tag_results(&self, dst: &mut TagMap) {
        if let Some(r) = self.child.result() {
            self.tagger.tag_result(dst, &r);
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
            size: Size {
                value: (child.size.value - self.skip).max(0),
                exact: child.size.exact,
            },
        }
    }

    fn optimize(self: Box<Self>) -> (Box<dyn Iterator>, bool) {
        let this = *self;
        let Skip {
            child,
            skip,
            tagger,
            ..
        } = this;
        let (child, changed) = child.optimize();
        if skip <= 0 && tagger.is_empty() {
            return (child, true);
        }
        let mut it = Skip::new(child, skip);
        it.tagger = tagger;
        (Box::new(it), changed)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterate::{drain, Fixed};

    #[test]
    fn discards_the_first_n_results() {
        let ctx = QueryContext::background();
        let child = Box::new(Fixed::new(vec![
            Ref::pre_fetched("a"),
            Ref::pre_fetched("b"),
            Ref::pre_fetched("c"),
        ]));
        let mut it = Skip::new(child, 2);
        assert_eq!(drain(&ctx, &mut it), vec![Ref::pre_fetched("c")]);
    }
}
