use crate::context::QueryContext;
use crate::error::StoreError;
use crate::iterate::{Iterator, Kind, Size, Stats, TagMap, Tagger};
use crate::refs::Ref;
use std::any::Any;

/// Complement of `child` relative to the reference set `all`.
///
/// Advances `all` and emits the entries `child` does not contain.
#[derive(Debug)]
pub struct Not {
    child: Box<dyn Iterator>,
    all: Box<dyn Iterator>,
    result: Option<Ref>,
    err: Option<StoreError>,
    tagger: Tagger,
}

impl Not {
    pub fn new(child: Box<dyn Iterator>, all: Box<dyn Iterator>) -> Self {
        Not {
            child,
            all,
            result: None,
            err: None,
            tagger: Tagger::default(),
        }
    }
}

impl Iterator for Not {
    fn kind(&self) -> Kind {
        Kind::Not
    }

    fn next(&mut self, ctx: &QueryContext) -> bool {
        if let Some(e) = ctx.done() {
            self.err = Some(e.into());
            return false;
        }
        while self.all.next(ctx) {
            let Some(cur) = self.all.result() else {
                continue;
            };
            if !self.child.contains(ctx, &cur) {
                self.result = Some(cur);
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
        if let Some(e) = ctx.done() {
            self.err = Some(e.into());
            return false;
        }
        if self.child.contains(ctx, v) {
            return false;
        }
        self.result = Some(v.clone());
        true
    }

    fn reset(&mut self) {
        self.child.reset();
        self.all.reset();
        self.result = None;
        self.err = None;
    }

    fn tag_results(&self, dst: &mut TagMap) {
        if let Some(r) = &self.result {
            self.tagger.tag_result(dst, r);
        }
        self.all.tag_results(dst);
    }

    fn tagger(&self) -> &Tagger {
        &self.tagger
    }

    fn tagger_mut(&mut self) -> &mut Tagger {
        &mut self.tagger
    }

    fn stats(&self) -> Stats {
        let all = self.all.stats();
        let child = self.child.stats();
        Stats {
            contains_cost: child.contains_cost,
            next_cost: all.next_cost + child.contains_cost,
            size: Size::approx((all.size.value - child.size.value).max(0)),
        }
    }

    fn optimize(self: Box<Self>) -> (Box<dyn Iterator>, bool) {
        let this = *self;
        let Not {
            child, all, tagger, ..
        } = this;
        let (child, c1) = child.optimize();
        let (all, c2) = all.optimize();
        let not = Not {
            child,
            all,
            result: None,
            err: None,
            tagger,
        };
        (Box::new(not), c1 || c2)
    }

    fn sub_iterators(&self) -> Vec<&dyn Iterator> {
        vec![self.child.as_ref(), self.all.as_ref()]
    }

    fn close(&mut self) -> Result<(), StoreError> {
        let res = self.child.close();
        let r = self.all.close();
        if res.is_ok() {
            r
        } else {
            res
        }
    }

    fn err(&self) -> Option<&StoreError> {
        self.err
            .as_ref()
            .or_else(|| self.child.err())
            .or_else(|| self.all.err())
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

    fn fixed(names: &[&str]) -> Box<dyn Iterator> {
        Box::new(Fixed::new(names.iter().map(|n| Ref::pre_fetched(*n)).collect()))
    }

    #[test]
    fn complement_relative_to_all() {
        let ctx = QueryContext::background();
        let mut it = Not::new(fixed(&["b", "d"]), fixed(&["a", "b", "c", "d"]));
        let all = drain(&ctx, &mut it);
        assert_eq!(all, vec![Ref::pre_fetched("a"), Ref::pre_fetched("c")]);
    }

    #[test]
    fn contains_is_negated_membership() {
        let ctx = QueryContext::background();
        let mut it = Not::new(fixed(&["b"]), fixed(&["a", "b"]));
        assert!(it.contains(&ctx, &Ref::pre_fetched("a")));
        assert!(!it.contains(&ctx, &Ref::pre_fetched("b")));
    }
}
