use crate::context::QueryContext;
use crate::error::StoreError;
use crate::iterate::{Iterator, Kind, Null, Size, Stats, TagMap, Tagger};
use crate::refs::Ref;
use std::any::Any;
use std::collections::HashSet;

/// Union of its children.
///
/// The default form de-duplicates across children by tracking seen refs. The
/// short-circuit form commits to the first child that produces any result and
/// drains only that child, without de-duplication.
#[derive(Debug)]
pub struct Or {
    sub: Vec<Box<dyn Iterator>>,
    short_circuit: bool,
    current: usize,
    committed: bool,
    seen: HashSet<Ref>,
    result: Option<Ref>,
    err: Option<StoreError>,
    tagger: Tagger,
}

impl Or {
    pub fn new(its: Vec<Box<dyn Iterator>>) -> Self {
        Or::build(its, false)
    }

    pub fn short_circuit(its: Vec<Box<dyn Iterator>>) -> Self {
        Or::build(its, true)
    }

    fn build(its: Vec<Box<dyn Iterator>>, short_circuit: bool) -> Self {
        Or {
            sub: its,
            short_circuit,
            current: 0,
            committed: false,
            seen: HashSet::new(),
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
}

impl Iterator for Or {
    fn kind(&self) -> Kind {
        Kind::Or
    }

    fn next(&mut self, ctx: &QueryContext) -> bool {
        if self.check_done(ctx) {
            return false;
        }
        while self.current < self.sub.len() {
            let it = &mut self.sub[self.current];
            while it.next(ctx) {
                let Some(r) = it.result() else {
                    continue;
                };
                if self.short_circuit {
                    self.committed = true;
                    self.result = Some(r);
                    return true;
                }
                if self.seen.insert(r.clone()) {
                    self.result = Some(r);
                    return true;
                }
            }
            if self.short_circuit && self.committed {
                break;
            }
            self.current += 1;
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
        match self.sub.get_mut(self.current) {
            Some(it) => it.next_path(ctx),
            None => false,
        }
    }

    fn contains(&mut self, ctx: &QueryContext, v: &Ref) -> bool {
        if self.check_done(ctx) {
            return false;
        }
        for (i, it) in self.sub.iter_mut().enumerate() {
            if it.contains(ctx, v) {
                self.current = i;
                self.result = Some(v.clone());
                return true;
            }
        }
        false
    }

    fn reset(&mut self) {
        for it in &mut self.sub {
            it.reset();
        }
        self.current = 0;
        self.committed = false;
        self.seen.clear();
        self.result = None;
        self.err = None;
    }

    fn tag_results(&self, dst: &mut TagMap) {
        if let Some(r) = &self.result {
            self.tagger.tag_result(dst, r);
        }
        if let Some(it) = self.sub.get(self.current) {
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
        let mut contains_cost = 0;
        let mut next_cost = 0;
        let mut size: i64 = 0;
        for it in &self.sub {
            let st = it.stats();
            contains_cost += st.contains_cost;
            next_cost += st.next_cost;
            size = if self.short_circuit {
                size.max(st.size.value)
            } else {
                size.saturating_add(st.size.value)
            };
        }
        Stats {
            contains_cost,
            next_cost,
            size: Size {
                value: size,
                exact: self.sub.len() <= 1,
            },
        }
    }

    fn optimize(self: Box<Self>) -> (Box<dyn Iterator>, bool) {
        let this = *self;
        let Or {
            sub,
            short_circuit,
            tagger,
            ..
        } = this;
        let mut changed = false;
        let mut children: Vec<Box<dyn Iterator>> = Vec::with_capacity(sub.len());
        for it in sub {
            let (it, ch) = it.optimize();
            changed |= ch;
            let size = it.stats().size;
            if it.kind() == Kind::Null || (size.exact && size.value == 0) {
                changed = true;
                continue;
            }
            if it.kind() == Kind::Or && it.tagger().is_empty() {
                let inner = it.into_any().downcast::<Or>().expect("kind checked");
                if inner.short_circuit == short_circuit {
                    children.extend(inner.sub);
                    changed = true;
                    continue;
                }
                children.push(inner);
            } else {
                children.push(it);
            }
        }
        if children.is_empty() {
            return (Box::new(Null::new()), true);
        }
        if children.len() == 1 {
            let mut only = children.pop().expect("one child");
            only.tagger_mut().copy_from(&tagger);
            return (only, true);
        }
        // cheap children first; a short-circuit union keeps its order, since
        // the order decides which child wins
        if !short_circuit {
            let sizes: Vec<i64> = children.iter().map(|it| it.stats().size.value).collect();
            if !sizes.windows(2).all(|w| w[0] <= w[1]) {
                changed = true;
                let mut pairs: Vec<(i64, Box<dyn Iterator>)> =
                    sizes.into_iter().zip(children).collect();
                pairs.sort_by_key(|(size, _)| *size);
                children = pairs.into_iter().map(|(_, it)| it).collect();
            }
        }
        let mut or = Or::build(children, short_circuit);
        or.tagger = tagger;
        (Box::new(or), changed)
    }

    fn sub_iterators(&self) -> Vec<&dyn Iterator> {
        self.sub.iter().map(|it| it.as_ref()).collect()
    }

    fn close(&mut self) -> Result<(), StoreError> {
        let mut res = Ok(());
        for it in &mut self.sub {
            let r = it.close();
            if res.is_ok() {
                res = r;
            }
        }
        self.seen.clear();
        res
    }

    fn err(&self) -> Option<&StoreError> {
        self.err
            .as_ref()
            .or_else(|| self.sub.iter().find_map(|it| it.err()))
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
    fn union_deduplicates_by_default() {
        let ctx = QueryContext::background();
        let mut it = Or::new(vec![fixed(&["a", "b"]), fixed(&["b", "c"])]);
        let all = drain(&ctx, &mut it);
        assert_eq!(
            all,
            vec![
                Ref::pre_fetched("a"),
                Ref::pre_fetched("b"),
                Ref::pre_fetched("c"),
            ]
        );
    }

    #[test]
    fn short_circuit_commits_to_the_first_producing_child() {
        let ctx = QueryContext::background();
        let mut it = Or::short_circuit(vec![fixed(&[]), fixed(&["b", "c"]), fixed(&["d"])]);
        let all = drain(&ctx, &mut it);
        assert_eq!(all, vec![Ref::pre_fetched("b"), Ref::pre_fetched("c")]);
    }

    #[test]
    fn contains_checks_every_child() {
        let ctx = QueryContext::background();
        let mut it = Or::new(vec![fixed(&["a"]), fixed(&["b"])]);
        assert!(it.contains(&ctx, &Ref::pre_fetched("a")));
        assert!(it.contains(&ctx, &Ref::pre_fetched("b")));
        assert!(!it.contains(&ctx, &Ref::pre_fetched("c")));
    }

    #[test]
    fn optimize_drops_empty_children() {
        let it: Box<dyn Iterator> = Box::new(Or::new(vec![fixed(&[]), fixed(&["a", "b"])]));
        let (opt, changed) = it.optimize();
        assert!(changed);
        assert_eq!(opt.kind(), Kind::Fixed);
        let ctx = QueryContext::background();
        let mut opt = opt;
        assert_eq!(drain(&ctx, opt.as_mut()).len(), 2);
    }

    #[test]
    fn reset_replays_the_union() {
        let ctx = QueryContext::background();
        let mut it = Or::new(vec![fixed(&["a", "b"]), fixed(&["b"])]);
        let first = drain(&ctx, &mut it);
        it.reset();
        let second = drain(&ctx, &mut it);
        assert_eq!(first, second);
    }
}
