use crate::context::QueryContext;
use crate::iterate::{Iterator, Kind, Size, Stats, TagMap, Tagger};
use crate::refs::Ref;
use std::any::Any;

/// The empty set.
#[derive(Debug, Default)]
pub struct Null {
    tagger: Tagger,
}

impl Null {
    pub fn new() -> Self {
        Null::default()
    }
}

impl Iterator for Null {
    fn kind(&self) -> Kind {
        Kind::Null
    }

    fn next(&mut self, _ctx: &QueryContext) -> bool {
        false
    }

    fn result(&self) -> Option<Ref> {
        None
    }

    fn next_path(&mut self, _ctx: &QueryContext) -> bool {
        false
    }

    fn contains(&mut self, _ctx: &QueryContext, _v: &Ref) -> bool {
        false
    }

    fn reset(&mut self) {}

    fn tag_results(&self, _dst: &mut TagMap) {}

    fn tagger(&self) -> &Tagger {
        &self.tagger
    }

    fn tagger_mut(&mut self) -> &mut Tagger {
        &mut self.tagger
    }

    fn stats(&self) -> Stats {
        Stats {
            size: Size::exact(0),
            ..Stats::default()
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
