use crate::context::QueryContext;
use crate::error::StoreError;
use crate::iterate::{Iterator, Kind, Null, Size, Stats, TagMap, Tagger};
use crate::quadstore::StoreRef;
use crate::refs::Ref;
use quiver_model::Direction;
use std::any::Any;

/// Lifts a node iterator to the quads whose `dir` endpoint is in that set.
#[derive(Debug)]
pub struct LinksTo {
    qs: StoreRef,
    pub(crate) primary: Box<dyn Iterator>,
    pub(crate) dir: Direction,
    next_it: Option<Box<dyn Iterator>>,
    result: Option<Ref>,
    err: Option<StoreError>,
    tagger: Tagger,
}

impl LinksTo {
    pub fn new(qs: StoreRef, primary: Box<dyn Iterator>, dir: Direction) -> Self {
        LinksTo {
            qs,
            primary,
            dir,
            next_it: None,
            result: None,
            err: None,
            tagger: Tagger::default(),
        }
    }

    pub fn direction(&self) -> Direction {
        self.dir
    }
}

impl Iterator for LinksTo {
    fn kind(&self) -> Kind {
        Kind::LinksTo
    }

    fn next(&mut self, ctx: &QueryContext) -> bool {
        loop {
            if let Some(e) = ctx.done() {
                self.err = Some(e.into());
                return false;
            }
            if let Some(next_it) = &mut self.next_it {
                if next_it.next(ctx) {
                    self.result = next_it.result();
                    if self.result.is_some() {
                        return true;
                    }
                }
            }
            if !self.primary.next(ctx) {
                self.result = None;
                return false;
            }
            let Some(node) = self.primary.result() else {
                continue;
            };
            self.next_it = Some(self.qs.quad_iterator(self.dir, &node));
        }
    }

    fn result(&self) -> Option<Ref> {
        self.result.clone()
    }

    fn next_path(&mut self, ctx: &QueryContext) -> bool {
        self.primary.next_path(ctx)
    }

    fn contains(&mut self, ctx: &QueryContext, v: &Ref) -> bool {
        if let Some(e) = ctx.done() {
            self.err = Some(e.into());
            return false;
        }
        let Some(node) = self.qs.quad_direction(v, self.dir) else {
            return false;
        };
        if self.primary.contains(ctx, &node) {
            self.result = Some(v.clone());
            return true;
        }
        false
    }

    fn reset(&mut self) {
        self.primary.reset();
        self.next_it = None;
        self.result = None;
        self.err = None;
    }

    fn tag_results(&self, dst: &mut TagMap) {
        if let Some(r) = &self.result {
            self.tagger.tag_result(dst, r);
        }
        self.primary.tag_results(dst);
    }

    fn tagger(&self) -> &Tagger {
        &self.tagger
    }

    fn tagger_mut(&mut self) -> &mut Tagger {
        &mut self.tagger
    }

    fn stats(&self) -> Stats {
        let p = self.primary.stats();
        Stats {
            contains_cost: p.contains_cost + 1,
            next_cost: p.next_cost + 1,
            size: Size::approx(p.size.value.saturating_mul(2)),
        }
    }

    fn optimize(self: Box<Self>) -> (Box<dyn Iterator>, bool) {
        let this = *self;
        let LinksTo {
            qs,
            primary,
            dir,
            tagger,
            ..
        } = this;
        let (primary, changed) = primary.optimize();
        if primary.kind() == Kind::Null {
            return (Box::new(Null::new()), true);
        }
        let mut lt = LinksTo::new(qs, primary, dir);
        lt.tagger = tagger;
        (Box::new(lt), changed)
    }

    fn sub_iterators(&self) -> Vec<&dyn Iterator> {
        vec![self.primary.as_ref()]
    }

    fn close(&mut self) -> Result<(), StoreError> {
        let res = self.primary.close();
        if let Some(next_it) = &mut self.next_it {
            let r = next_it.close();
            if res.is_ok() {
                return r;
            }
        }
        res
    }

    fn err(&self) -> Option<&StoreError> {
        self.err
            .as_ref()
            .or_else(|| self.primary.err())
            .or_else(|| self.next_it.as_ref().and_then(|it| it.err()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
