use crate::context::QueryContext;
use crate::error::StoreError;
use crate::iterate::{Iterator, Kind, Size, Stats, TagMap, Tagger};
use crate::refs::Ref;
use std::any::Any;

/// Passthrough bounded to the first `limit` results encountered.
/// A limit of zero or less passes everything through.
#[derive(Debug)]
pub struct Limit {
    child: Box<dyn Iterator>,
    limit: i64,
    count: i64,
    tagger: Tagger,
}

impl Limit {
    pub fn new(child: Box<dyn Iterator>, limit: i64) -> Self {
        Limit {
            child,
            limit,
            count: 0,
            tagger: Tagger::default(),
        }
    }

    fn reached(&self) -> bool {
        self.limit > 0 && self.count >= self.limit
    }
}

impl Iterator for Limit {
    fn kind(&self) -> Kind {
        Kind::Limit
    }

    fn next(&mut self, ctx: &QueryContext) -> bool {
        if self.reached() {
            return false;
        }
        if self.child.next(ctx) {
            self.count += 1;
            return true;
        }
        false
    }

    fn result(&self) -> Option<Ref> {
        self.child.result()
    }

    fn next_path(&mut self, ctx: &QueryContext) -> bool {
        if self.reached() {
            return false;
        }
        if self.child.next_path(ctx) {
            self.count += 1;
            return true;
        }
        false
    }

    fn contains(&mut self, ctx: &QueryContext, v: &Ref) -> bool {
        self.child.contains(ctx, v)
    }

    fn reset(&mut self) {
        self.child.reset();
        self.count = 0;
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
        let size = if self.limit > 0 {
            Size {
                value: child.size.value.min(self.limit),
                exact: child.size.exact && child.size.value <= self.limit,
            }
        } else {
            child.size
        };
        Stats {
            contains_cost: child.contains_cost,
            next_cost: child.next_cost,
            size,
        }
    }

    fn optimize(self: Box<Self>) -> (Box<dyn Iterator>, bool) {
        let this = *self;
        let Limit {
            child,
            limit,
            tagger,
            ..
        } = this;
        let (child, changed) = child.optimize();
        if limit <= 0 && tagger.is_empty() {
            return (child, true);
        }
        let mut it = Limit::new(child, limit);
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
    fn stops_after_the_first_n_results() {
        let ctx = QueryContext::background();
        let child = Box::new(Fixed::new(vec![
            Ref::pre_fetched("a"),
            Ref::pre_fetched("b"),
            Ref::pre_fetched("c"),
        ]));
        let mut it = Limit::new(child, 2);
        assert_eq!(drain(&ctx, &mut it).len(), 2);
        it.reset();
        assert_eq!(drain(&ctx, &mut it).len(), 2);
    }

    #[test]
    fn non_positive_limit_is_unbounded() {
        let ctx = QueryContext::background();
        let child = Box::new(Fixed::new(vec![Ref::pre_fetched("a"), Ref::pre_fetched("b")]));
        let mut it = Limit::new(child, 0);
        assert_eq!(drain(&ctx, &mut it).len(), 2);
    }
}
