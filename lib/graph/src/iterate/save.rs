use crate::context::QueryContext;
use crate::error::StoreError;
use crate::iterate::{Iterator, Kind, Stats, TagMap, Tagger};
use crate::refs::Ref;
use std::any::Any;

/// Passthrough that records the child's current result under one or more
/// tags.
#[derive(Debug)]
pub struct Save {
    child: Box<dyn Iterator>,
    tags: Vec<String>,
    tagger: Tagger,
}

impl Save {
    pub fn new(child: Box<dyn Iterator>, tag: impl Into<String>) -> Self {
        Save {
            child,
            tags: vec![tag.into()],
            tagger: Tagger::default(),
        }
    }

    pub fn with_tags(child: Box<dyn Iterator>, tags: Vec<String>) -> Self {
        Save {
            child,
            tags,
            tagger: Tagger::default(),
        }
    }
}

impl Iterator for Save {
    fn kind(&self) -> Kind {
        Kind::Save
    }

    fn next(&mut self, ctx: &QueryContext) -> bool {
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
    }

    fn tag_results(&self, dst: &mut TagMap) {
        if let Some(r) = self.child.result() {
            for tag in &self.tags {
                dst.insert(tag.clone(), r.clone());
            }
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
        self.child.stats()
    }

    fn optimize(self: Box<Self>) -> (Box<dyn Iterator>, bool) {
        let this = *self;
        let Save {
            child,
            tags,
            tagger,
        } = this;
        let (child, changed) = child.optimize();
        if tags.is_empty() && tagger.is_empty() {
            return (child, true);
        }
        if child.kind() == Kind::Null {
            return (child, true);
        }
        let save = Save {
            child,
            tags,
            tagger,
        };
        (Box::new(save), changed)
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
    use crate::iterate::Fixed;

    #[test]
    fn saves_every_result_under_the_tag() {
        let ctx = QueryContext::background();
        let child = Box::new(Fixed::new(vec![Ref::pre_fetched("a"), Ref::pre_fetched("b")]));
        let mut it = Save::new(child, "node");
        assert!(it.next(&ctx));
        let mut tags = TagMap::new();
        it.tag_results(&mut tags);
        assert_eq!(tags.get("node"), Some(&Ref::pre_fetched("a")));
        assert!(it.next(&ctx));
        let mut tags = TagMap::new();
        it.tag_results(&mut tags);
        assert_eq!(tags.get("node"), Some(&Ref::pre_fetched("b")));
    }

    #[test]
    fn contains_positions_the_saved_tag() {
        let ctx = QueryContext::background();
        let child = Box::new(Fixed::new(vec![Ref::pre_fetched("a"), Ref::pre_fetched("b")]));
        let mut it = Save::new(child, "node");
        assert!(it.contains(&ctx, &Ref::pre_fetched("b")));
        let mut tags = TagMap::new();
        it.tag_results(&mut tags);
        assert_eq!(tags.get("node"), Some(&Ref::pre_fetched("b")));
    }
}
