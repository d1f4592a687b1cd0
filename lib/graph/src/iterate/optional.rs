use crate::context::QueryContext;
use crate::error::StoreError;
use crate::iterate::{Iterator, Kind, Size, Stats, TagMap, Tagger};
use crate::refs::Ref;
use std::any::Any;

/// An optional join constraint.
///
/// As a membership check it always succeeds; the tags of the wrapped child
/// are only reported when the child actually matched, otherwise the binding
/// stays null. Advancing an optional directly is a usage error and fails
/// the iteration.
#[derive(Debug)]
pub struct Optional {
    child: Box<dyn Iterator>,
    last_check: bool,
    err: Option<StoreError>,
    tagger: Tagger,
}

impl Optional {
    pub fn new(child: Box<dyn Iterator>) -> Self {
        Optional {
            child,
            last_check: false,
            err: None,
            tagger: Tagger::default(),
        }
    }
}

impl Iterator for Optional {
    fn kind(&self) -> Kind {
        Kind::Optional
    }

    fn next(&mut self, _ctx: &QueryContext) -> bool {
        self.err = Some(StoreError::other(
            "optional iterator cannot be iterated directly",
        ));
        false
    }

    fn result(&self) -> Option<Ref> {
        if self.last_check {
            self.child.result()
        } else {
            None
        }
    }

    fn next_path(&mut self, ctx: &QueryContext) -> bool {
        if self.last_check {
            self.child.next_path(ctx)
        } else {
            false
        }
    }

    fn contains(&mut self, ctx: &QueryContext, v: &Ref) -> bool {
        self.last_check = self.child.contains(ctx, v);
        true
    }

    fn reset(&mut self) {
        self.child.reset();
        self.last_check = false;
        self.err = None;
    }

    fn tag_results(&self, dst: &mut TagMap) {
        if self.last_check {
            self.child.tag_results(dst);
            if let Some(r) = self.child.result() {
                self.tagger.tag_result(dst, &r);
            }
        }
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
            next_cost: 0,
            size: Size::approx(child.size.value),
        }
    }

    fn optimize(self: Box<Self>) -> (Box<dyn Iterator>, bool) {
        let this = *self;
        let Optional { child, tagger, .. } = this;
        let (child, changed) = child.optimize();
        let mut opt = Optional::new(child);
        opt.tagger = tagger;
        (Box::new(opt), changed)
    }

    fn sub_iterators(&self) -> Vec<&dyn Iterator> {
        vec![self.child.as_ref()]
    }

    fn close(&mut self) -> Result<(), StoreError> {
        self.child.close()
    }

    fn err(&self) -> Option<&StoreError> {
        self.err.as_ref().or_else(|| self.child.err())
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
    use crate::iterate::Fixed;

    #[test]
    fn contains_always_succeeds() {
        let ctx = QueryContext::background();
        let child = Box::new(Fixed::new(vec![Ref::pre_fetched("a")]));
        let mut it = Optional::new(child);
        assert!(it.contains(&ctx, &Ref::pre_fetched("a")));
        assert!(it.contains(&ctx, &Ref::pre_fetched("z")));
    }

    #[test]
    fn tags_only_reported_on_a_real_match() {
        let ctx = QueryContext::background();
        let mut child = Box::new(Fixed::new(vec![Ref::pre_fetched("a")]));
        child.tagger_mut().add("x");
        let mut it = Optional::new(child);

        assert!(it.contains(&ctx, &Ref::pre_fetched("a")));
        let mut tags = TagMap::new();
        it.tag_results(&mut tags);
        assert_eq!(tags.get("x"), Some(&Ref::pre_fetched("a")));

        assert!(it.contains(&ctx, &Ref::pre_fetched("z")));
        let mut tags = TagMap::new();
        it.tag_results(&mut tags);
        assert!(tags.is_empty());
    }
}
