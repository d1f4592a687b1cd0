use crate::context::QueryContext;
use crate::iterate::{Iterator, Kind, Null, Size, Stats, TagMap, Tagger};
use crate::refs::Ref;
use std::any::Any;

/// Exactly the given set of refs, in insertion order.
#[derive(Debug, Default)]
pub struct Fixed {
    values: Vec<Ref>,
    index: usize,
    result: Option<Ref>,
    tagger: Tagger,
}

impl Fixed {
    pub fn new(values: Vec<Ref>) -> Self {
        Fixed {
            values,
            ..Fixed::default()
        }
    }

    pub fn add(&mut self, v: Ref) {
        self.values.push(v);
    }

    pub fn values(&self) -> &[Ref] {
        &self.values
    }
}

impl Iterator for Fixed {
    fn kind(&self) -> Kind {
        Kind::Fixed
    }

    fn next(&mut self, _ctx: &QueryContext) -> bool {
        if self.index >= self.values.len() {
            self.result = None;
            return false;
        }
        self.result = Some(self.values[self.index].clone());
        self.index += 1;
        true
    }

    fn result(&self) -> Option<Ref> {
        self.result.clone()
    }

    fn next_path(&mut self, _ctx: &QueryContext) -> bool {
        false
    }

    fn contains(&mut self, _ctx: &QueryContext, v: &Ref) -> bool {
        if self.values.contains(v) {
            self.result = Some(v.clone());
            return true;
        }
        false
    }

    fn reset(&mut self) {
        self.index = 0;
        self.result = None;
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
            size: Size::exact(self.values.len() as i64),
        }
    }

    fn optimize(self: Box<Self>) -> (Box<dyn Iterator>, bool) {
        if self.values.is_empty() && self.tagger.is_empty() {
            return (Box::new(Null::new()), true);
        }
        (self, false)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
