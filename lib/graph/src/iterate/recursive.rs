use crate::context::QueryContext;
use crate::error::StoreError;
use crate::iterate::{ApplyMorphism, Fixed, Iterator, Kind, Size, Stats, TagMap, Tagger};
use crate::quadstore::StoreRef;
use crate::refs::Ref;
use std::any::Any;
use std::collections::HashSet;
use std::fmt;

/// Fixed-point traversal: applies a morphism to the frontier until no new
/// nodes appear or the depth bound is reached.
///
/// Emits every node reachable in one or more applications, de-duplicated,
/// breadth-first. A non-positive `max_depth` means unbounded; the visited set
/// guarantees termination on cyclic data either way.
pub struct Recursive {
    qs: StoreRef,
    start: Box<dyn Iterator>,
    morphism: ApplyMorphism,
    max_depth: i32,
    depth: i32,
    started: bool,
    frontier: Vec<Ref>,
    cur_it: Option<Box<dyn Iterator>>,
    seen: HashSet<Ref>,
    emitted: HashSet<Ref>,
    result: Option<Ref>,
    err: Option<StoreError>,
    tagger: Tagger,
}

impl fmt::Debug for Recursive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recursive")
            .field("start", &self.start)
            .field("max_depth", &self.max_depth)
            .field("depth", &self.depth)
            .field("seen", &self.seen.len())
            .finish_non_exhaustive()
    }
}

impl Recursive {
    pub fn new(
        qs: StoreRef,
        start: Box<dyn Iterator>,
        morphism: ApplyMorphism,
        max_depth: i32,
    ) -> Self {
        Recursive {
            qs,
            start,
            morphism,
            max_depth,
            depth: 0,
            started: false,
            frontier: Vec::new(),
            cur_it: None,
            seen: HashSet::new(),
            emitted: HashSet::new(),
            result: None,
            err: None,
            tagger: Tagger::default(),
        }
    }

    /// Collects the start set into the initial frontier without emitting it.
    fn start_frontier(&mut self, ctx: &QueryContext) {
        while self.start.next(ctx) {
            if let Some(r) = self.start.result() {
                if self.seen.insert(r.clone()) {
                    self.frontier.push(r);
                }
            }
        }
        self.started = true;
    }

    fn advance_frontier(&mut self) -> bool {
        if self.frontier.is_empty() {
            return false;
        }
        if self.max_depth > 0 && self.depth >= self.max_depth {
            return false;
        }
        self.depth += 1;
        let seed = Fixed::new(std::mem::take(&mut self.frontier));
        self.cur_it = Some((self.morphism)(&self.qs, Box::new(seed)));
        true
    }
}

impl Iterator for Recursive {
    fn kind(&self) -> Kind {
        Kind::Recursive
    }

    fn next(&mut self, ctx: &QueryContext) -> bool {
        loop {
            if let Some(e) = ctx.done() {
                self.err = Some(e.into());
                return false;
            }
            if !self.started {
                self.start_frontier(ctx);
                if !self.advance_frontier() {
                    return false;
                }
            }
            if let Some(cur) = &mut self.cur_it {
                while cur.next(ctx) {
                    let Some(r) = cur.result() else {
                        continue;
                    };
                    if self.seen.insert(r.clone()) {
                        self.frontier.push(r.clone());
                        self.emitted.insert(r.clone());
                        self.result = Some(r);
                        return true;
                    }
                }
            }
            if !self.advance_frontier() {
                self.result = None;
                return false;
            }
        }
    }

    fn result(&self) -> Option<Ref> {
        self.result.clone()
    }

    fn next_path(&mut self, _ctx: &QueryContext) -> bool {
        false
    }

    fn contains(&mut self, ctx: &QueryContext, v: &Ref) -> bool {
        if self.emitted.contains(v) {
            self.result = Some(v.clone());
            return true;
        }
        while self.next(ctx) {
            if self.result.as_ref() == Some(v) {
                return true;
            }
        }
        false
    }

    fn reset(&mut self) {
        self.start.reset();
        self.depth = 0;
        self.started = false;
        self.frontier.clear();
        self.cur_it = None;
        self.seen.clear();
        self.emitted.clear();
        self.result = None;
        self.err = None;
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
        let start = self.start.stats();
        Stats {
            contains_cost: start.next_cost * 2,
            next_cost: start.next_cost * 2,
            size: Size::approx(start.size.value.saturating_mul(10).max(1)),
        }
    }

    fn optimize(self: Box<Self>) -> (Box<dyn Iterator>, bool) {
        let this = *self;
        let Recursive {
            qs,
            start,
            morphism,
            max_depth,
            tagger,
            ..
        } = this;
        let (start, changed) = start.optimize();
        let mut it = Recursive::new(qs, start, morphism, max_depth);
        it.tagger = tagger;
        (Box::new(it), changed)
    }

    fn sub_iterators(&self) -> Vec<&dyn Iterator> {
        vec![self.start.as_ref()]
    }

    fn close(&mut self) -> Result<(), StoreError> {
        let res = self.start.close();
        if let Some(cur) = &mut self.cur_it {
            let r = cur.close();
            if res.is_ok() {
                return r;
            }
        }
        res
    }

    fn err(&self) -> Option<&StoreError> {
        self.err
            .as_ref()
            .or_else(|| self.start.err())
            .or_else(|| self.cur_it.as_ref().and_then(|it| it.err()))
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
    use crate::graphmock::GraphMock;
    use crate::iterate::{drain, And, HasA, LinksTo};
    use quiver_model::{iri, Direction, Quad, Value};
    use std::sync::Arc;

    /// One forward step over `pred`, rebuilt per frontier.
    fn follow(pred: Value) -> ApplyMorphism {
        Arc::new(move |qs: &StoreRef, input: Box<dyn Iterator>| {
            let preds = match qs.value_of(&pred) {
                Some(r) => vec![r],
                None => Vec::new(),
            };
            let trail: Box<dyn Iterator> = Box::new(LinksTo::new(
                qs.clone(),
                Box::new(Fixed::new(preds)),
                Direction::Predicate,
            ));
            let dest: Box<dyn Iterator> =
                Box::new(LinksTo::new(qs.clone(), input, Direction::Subject));
            let route: Box<dyn Iterator> = Box::new(And::new(vec![trail, dest]));
            Box::new(HasA::new(qs.clone(), route, Direction::Object))
        })
    }

    fn chain() -> StoreRef {
        GraphMock::shared([
            Quad::triple(iri("a"), iri("p"), iri("b")),
            Quad::triple(iri("b"), iri("p"), iri("c")),
            Quad::triple(iri("c"), iri("p"), iri("d")),
        ])
    }

    fn start(qs: &StoreRef, name: &str) -> Box<dyn Iterator> {
        Box::new(Fixed::new(vec![qs.value_of(&iri(name)).unwrap()]))
    }

    #[test]
    fn reaches_the_transitive_closure() {
        let ctx = QueryContext::background();
        let qs = chain();
        let mut it = Recursive::new(qs.clone(), start(&qs, "a"), follow(iri("p")), 0);
        let mut reached: Vec<Value> = drain(&ctx, &mut it)
            .iter()
            .filter_map(|r| qs.name_of(r))
            .collect();
        reached.sort();
        assert_eq!(reached, vec![iri("b"), iri("c"), iri("d")]);
        it.close().unwrap();
    }

    #[test]
    fn depth_bound_stops_the_expansion() {
        let ctx = QueryContext::background();
        let qs = chain();
        let mut it = Recursive::new(qs.clone(), start(&qs, "a"), follow(iri("p")), 1);
        let reached: Vec<Value> = drain(&ctx, &mut it)
            .iter()
            .filter_map(|r| qs.name_of(r))
            .collect();
        assert_eq!(reached, vec![iri("b")]);
    }

    #[test]
    fn cycles_terminate() {
        let ctx = QueryContext::background();
        let qs = GraphMock::shared([
            Quad::triple(iri("a"), iri("p"), iri("b")),
            Quad::triple(iri("b"), iri("p"), iri("a")),
        ]);
        let mut it = Recursive::new(qs.clone(), start(&qs, "a"), follow(iri("p")), 0);
        let reached: Vec<Value> = drain(&ctx, &mut it)
            .iter()
            .filter_map(|r| qs.name_of(r))
            .collect();
        // the start node is never re-emitted
        assert_eq!(reached, vec![iri("b")]);
    }

    #[test]
    fn contains_covers_emitted_nodes_only() {
        let ctx = QueryContext::background();
        let qs = chain();
        let mut it = Recursive::new(qs.clone(), start(&qs, "a"), follow(iri("p")), 0);
        let c = qs.value_of(&iri("c")).unwrap();
        let a = qs.value_of(&iri("a")).unwrap();
        assert!(it.contains(&ctx, &c));
        assert!(!it.contains(&ctx, &a));
    }

    #[test]
    fn reset_replays_the_traversal() {
        let ctx = QueryContext::background();
        let qs = chain();
        let mut it = Recursive::new(qs.clone(), start(&qs, "a"), follow(iri("p")), 0);
        let first = drain(&ctx, &mut it);
        it.reset();
        let second = drain(&ctx, &mut it);
        assert_eq!(first, second);
    }
}
