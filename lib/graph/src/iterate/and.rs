use crate::context::QueryContext;
use crate::error::StoreError;
use crate::iterate::{Iterator, Kind, Null, Size, Stats, TagMap, Tagger};
use crate::refs::Ref;
use std::any::Any;

/// Intersection of its children.
///
/// One child is the primary: it is iterated, and every candidate is
/// contains-checked against the remaining children in order. [`And::optimize`]
/// promotes the smallest child to primary and orders the rest by ascending
/// contains cost.
#[derive(Debug)]
pub struct And {
    primary: Box<dyn Iterator>,
    secondary: Vec<Box<dyn Iterator>>,
    result: Option<Ref>,
    err: Option<StoreError>,
    tagger: Tagger,
}

impl And {
    pub fn new(mut its: Vec<Box<dyn Iterator>>) -> Self {
        let primary: Box<dyn Iterator> = if its.is_empty() {
            Box::new(Null::new())
        } else {
            its.remove(0)
        };
        And {
            primary,
            secondary: its,
            result: None,
            err: None,
            tagger: Tagger::default(),
        }
    }

    fn check_done(&mut self, ctx: &QueryContext) -> bool {
        if let Some(e) = ctx.done() {
            self.err = Some(e.into());
            return true;
        }
        false
    }

    fn check_constraints(&mut self, ctx: &QueryContext, v: &Ref) -> bool {
        for it in &mut self.secondary {
            if !it.contains(ctx, v) {
                return false;
            }
        }
        true
    }
}

impl Iterator for And {
    fn kind(&self) -> Kind {
        Kind::And
    }

    fn next(&mut self, ctx: &QueryContext) -> bool {
        if self.check_done(ctx) {
            return false;
        }
        while self.primary.next(ctx) {
            if self.check_done(ctx) {
                return false;
            }
            let Some(cur) = self.primary.result() else {
                continue;
            };
            if self.check_constraints(ctx, &cur) {
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

    fn next_path(&mut self, ctx: &QueryContext) -> bool {
        if self.check_done(ctx) {
            return false;
        }
        if self.primary.next_path(ctx) {
            return true;
        }
        for it in &mut self.secondary {
            if it.next_path(ctx) {
                return true;
            }
        }
        false
    }

    fn contains(&mut self, ctx: &QueryContext, v: &Ref) -> bool {
        if self.check_done(ctx) {
            return false;
        }
        if self.primary.contains(ctx, v) && self.check_constraints(ctx, v) {
            self.result = Some(v.clone());
            return true;
        }
        false
    }

    fn reset(&mut self) {
        self.primary.reset();
        for it in &mut self.secondary {
            it.reset();
        }
        self.result = None;
        self.err = None;
    }

    fn tag_results(&self, dst: &mut TagMap) {
        if let Some(r) = &self.result {
            self.tagger.tag_result(dst, r);
        }
        self.primary.tag_results(dst);
        for it in &self.secondary {
            it.tag_results(dst);
        }
    }

    fn tagger(&self) -> &Tagger {
        &self.tagger
    }

    fn tagger_mut(&mut self) -> &mut Tagger {
        &mut self.tagger
    }

    fn stats(&self) -> Stats {
        let p = self.primary.stats();
        let mut contains_cost = p.contains_cost;
        let mut next_cost = p.next_cost;
        let mut size = p.size.value;
        let mut exact = p.size.exact && self.secondary.is_empty();
        for it in &self.secondary {
            let st = it.stats();
            contains_cost += st.contains_cost;
            next_cost += st.contains_cost;
            if st.size.value < size {
                size = st.size.value;
                exact = false;
            }
        }
        Stats {
            contains_cost,
            next_cost,
            size: Size { value: size, exact },
        }
    }

    fn optimize(self: Box<Self>) -> (Box<dyn Iterator>, bool) {
        let this = *self;
        let And {
            primary,
            secondary,
            tagger,
            ..
        } = this;
        let mut changed = false;
        let mut children: Vec<Box<dyn Iterator>> = Vec::with_capacity(1 + secondary.len());
        for it in std::iter::once(primary).chain(secondary) {
            let (it, ch) = it.optimize();
            changed |= ch;
            // reassociate nested conjunctions that carry no tags of their own
            if it.kind() == Kind::And && it.tagger().is_empty() {
                let inner = it.into_any().downcast::<And>().expect("kind checked");
                children.push(inner.primary);
                children.extend(inner.secondary);
                changed = true;
            } else {
                children.push(it);
            }
        }
        // a provably empty child empties the whole conjunction
        if children.iter().any(|it| {
            let size = it.stats().size;
            it.kind() == Kind::Null || (size.exact && size.value == 0)
        }) {
            tracing::debug!("conjunction has an empty child, rewriting to null");
            return (Box::new(Null::new()), true);
        }
        if children.len() == 1 {
            let mut only = children.pop().expect("one child");
            only.tagger_mut().copy_from(&tagger);
            return (only, true);
        }
        // promote the smallest child, order the rest by ascending contains cost
        let mut min_idx = 0;
        let mut min_size = i64::MAX;
        for (i, it) in children.iter().enumerate() {
            let sz = it.stats().size.value;
            if sz < min_size {
                min_size = sz;
                min_idx = i;
            }
        }
        if min_idx != 0 {
            changed = true;
        }
        let primary = children.remove(min_idx);
        let costs: Vec<i64> = children.iter().map(|it| it.stats().contains_cost).collect();
        if !costs.windows(2).all(|w| w[0] <= w[1]) {
            changed = true;
            let mut pairs: Vec<(i64, Box<dyn Iterator>)> = costs.into_iter().zip(children).collect();
            pairs.sort_by_key(|(cost, _)| *cost);
            children = pairs.into_iter().map(|(_, it)| it).collect();
        }
        let and = And {
            primary,
            secondary: children,
            result: None,
            err: None,
            tagger,
        };
        (Box::new(and), changed)
    }

    fn sub_iterators(&self) -> Vec<&dyn Iterator> {
        let mut subs: Vec<&dyn Iterator> = vec![self.primary.as_ref()];
        subs.extend(self.secondary.iter().map(|it| it.as_ref()));
        subs
    }

    fn close(&mut self) -> Result<(), StoreError> {
        let mut res = self.primary.close();
        for it in &mut self.secondary {
            let r = it.close();
            if res.is_ok() {
                res = r;
            }
        }
        res
    }

    fn err(&self) -> Option<&StoreError> {
        self.err
            .as_ref()
            .or_else(|| self.primary.err())
            .or_else(|| self.secondary.iter().find_map(|it| it.err()))
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
    fn intersection_of_fixed_sets() {
        let ctx = QueryContext::background();
        let mut it = And::new(vec![fixed(&["a", "b", "c", "d"]), fixed(&["b", "d", "e"])]);
        let all = drain(&ctx, &mut it);
        assert_eq!(all, vec![Ref::pre_fetched("b"), Ref::pre_fetched("d")]);
        assert!(it.err().is_none());
        it.close().unwrap();
    }

    #[test]
    fn tags_from_both_children_are_merged() {
        let ctx = QueryContext::background();
        let mut left = fixed(&["a", "b"]);
        left.tagger_mut().add("left");
        let mut right = fixed(&["b"]);
        right.tagger_mut().add("right");
        let mut it = And::new(vec![left, right]);
        it.tagger_mut().add("top");

        assert!(it.next(&ctx));
        let mut tags = TagMap::new();
        it.tag_results(&mut tags);
        assert_eq!(tags.get("left"), Some(&Ref::pre_fetched("b")));
        assert_eq!(tags.get("right"), Some(&Ref::pre_fetched("b")));
        assert_eq!(tags.get("top"), Some(&Ref::pre_fetched("b")));
        assert!(!it.next(&ctx));
    }

    #[test]
    fn contains_requires_every_child() {
        let ctx = QueryContext::background();
        let mut it = And::new(vec![fixed(&["a", "b"]), fixed(&["b", "c"])]);
        assert!(it.contains(&ctx, &Ref::pre_fetched("b")));
        assert!(!it.contains(&ctx, &Ref::pre_fetched("a")));
        assert!(!it.contains(&ctx, &Ref::pre_fetched("c")));
    }

    #[test]
    fn optimize_promotes_the_smallest_child() {
        let it: Box<dyn Iterator> =
            Box::new(And::new(vec![fixed(&["a", "b", "c"]), fixed(&["b"])]));
        let (opt, changed) = it.optimize();
        assert!(changed);
        assert_eq!(opt.kind(), Kind::And);
        let and = opt.as_any().downcast_ref::<And>().unwrap();
        assert_eq!(and.primary.stats().size, Size::exact(1));
    }

    #[test]
    fn optimize_rewrites_empty_children_to_null() {
        let it: Box<dyn Iterator> = Box::new(And::new(vec![fixed(&["a"]), fixed(&[])]));
        let (opt, changed) = it.optimize();
        assert!(changed);
        assert_eq!(opt.kind(), Kind::Null);
    }

    #[test]
    fn optimize_flattens_nested_conjunctions() {
        let inner: Box<dyn Iterator> = Box::new(And::new(vec![fixed(&["a", "b"]), fixed(&["b"])]));
        let it: Box<dyn Iterator> = Box::new(And::new(vec![fixed(&["a", "b", "c"]), inner]));
        let (opt, changed) = it.optimize();
        assert!(changed);
        let and = opt.as_any().downcast_ref::<And>().unwrap();
        assert_eq!(and.sub_iterators().len(), 3);
    }

    #[test]
    fn cancelled_context_stops_iteration() {
        let (ctx, handle) = QueryContext::with_cancel();
        let mut it = And::new(vec![fixed(&["a", "b"]), fixed(&["a", "b"])]);
        assert!(it.next(&ctx));
        handle.cancel();
        assert!(!it.next(&ctx));
        assert!(matches!(it.err(), Some(StoreError::Query(_))));
    }
}
