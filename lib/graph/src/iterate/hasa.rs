use crate::context::QueryContext;
use crate::error::StoreError;
use crate::iterate::{Iterator, Kind, LinksTo, Null, Size, Stats, TagMap, Tagger};
use crate::quadstore::StoreRef;
use crate::refs::Ref;
use quiver_model::Direction;
use std::any::Any;

/// Projects a quad iterator onto the node at `dir`.
///
/// The inverse of [`LinksTo`]: advancing yields, for every quad the primary
/// produces, the node standing at the projected position. A membership check
/// scans the store's quads around the candidate node and asks the primary to
/// accept one of them; enumerating further accepting quads is exactly the
/// alternative-binding protocol, so `next_path` continues that scan.
#[derive(Debug)]
pub struct HasA {
    qs: StoreRef,
    pub(crate) primary: Box<dyn Iterator>,
    pub(crate) dir: Direction,
    result_it: Option<Box<dyn Iterator>>,
    check_ref: Option<Ref>,
    result: Option<Ref>,
    err: Option<StoreError>,
    tagger: Tagger,
}

impl HasA {
    pub fn new(qs: StoreRef, primary: Box<dyn Iterator>, dir: Direction) -> Self {
        HasA {
            qs,
            primary,
            dir,
            result_it: None,
            check_ref: None,
            result: None,
            err: None,
            tagger: Tagger::default(),
        }
    }

    pub fn direction(&self) -> Direction {
        self.dir
    }

    fn next_contains(&mut self, ctx: &QueryContext) -> bool {
        let Some(result_it) = &mut self.result_it else {
            return false;
        };
        while result_it.next(ctx) {
            if ctx.is_done() {
                break;
            }
            let Some(link) = result_it.result() else {
                continue;
            };
            if self.primary.contains(ctx, &link) {
                self.result = self.check_ref.clone();
                return true;
            }
        }
        false
    }
}

impl Iterator for HasA {
    fn kind(&self) -> Kind {
        Kind::HasA
    }

    fn next(&mut self, ctx: &QueryContext) -> bool {
        loop {
            if let Some(e) = ctx.done() {
                self.err = Some(e.into());
                return false;
            }
            if !self.primary.next(ctx) {
                self.result = None;
                return false;
            }
            let Some(link) = self.primary.result() else {
                continue;
            };
            // quads without the projected endpoint (e.g. unlabeled quads
            // projected on Label) are skipped
            if let Some(node) = self.qs.quad_direction(&link, self.dir) {
                self.result_it = None;
                self.check_ref = None;
                self.result = Some(node);
                return true;
            }
        }
    }

    fn result(&self) -> Option<Ref> {
        self.result.clone()
    }

    fn next_path(&mut self, ctx: &QueryContext) -> bool {
        if self.result_it.is_some() {
            // an alternative path is the next accepting quad
            return self.next_contains(ctx);
        }
        self.primary.next_path(ctx)
    }

    fn contains(&mut self, ctx: &QueryContext, v: &Ref) -> bool {
        if let Some(e) = ctx.done() {
            self.err = Some(e.into());
            return false;
        }
        self.result_it = Some(self.qs.quad_iterator(self.dir, v));
        self.check_ref = Some(v.clone());
        self.next_contains(ctx)
    }

    fn reset(&mut self) {
        self.primary.reset();
        self.result_it = None;
        self.check_ref = None;
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
            contains_cost: p.contains_cost + 2,
            next_cost: p.next_cost + 1,
            size: Size::approx(p.size.value),
        }
    }

    fn optimize(self: Box<Self>) -> (Box<dyn Iterator>, bool) {
        let this = *self;
        let HasA {
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
        // HasA ∘ LinksTo on the same direction is the identity on the node set
        let primary = if primary.kind() == Kind::LinksTo {
            let links = primary.into_any().downcast::<LinksTo>().expect("kind checked");
            if links.dir == dir && links.tagger().is_empty() {
                tracing::debug!(dir = %dir, "fusing has-a over links-to");
                let mut node_it = links.primary;
                node_it.tagger_mut().copy_from(&tagger);
                return (node_it, true);
            }
            links as Box<dyn Iterator>
        } else {
            primary
        };
        let mut hasa = HasA::new(qs, primary, dir);
        hasa.tagger = tagger;
        (Box::new(hasa), changed)
    }

    fn sub_iterators(&self) -> Vec<&dyn Iterator> {
        vec![self.primary.as_ref()]
    }

    fn close(&mut self) -> Result<(), StoreError> {
        let res = self.primary.close();
        if let Some(result_it) = &mut self.result_it {
            let r = result_it.close();
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
            .or_else(|| self.result_it.as_ref().and_then(|it| it.err()))
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
    use crate::iterate::{drain, Fixed};
    use quiver_model::{iri, Quad, Value};

    fn store() -> StoreRef {
        GraphMock::shared([
            Quad::triple(iri("a"), iri("p"), iri("b")),
            Quad::triple(iri("a"), iri("q"), iri("b")),
            Quad::triple(iri("c"), iri("p"), iri("b")),
        ])
    }

    #[test]
    fn advancing_projects_each_quad_onto_a_node() {
        let ctx = QueryContext::background();
        let qs = store();
        let mut it = HasA::new(qs.clone(), qs.quads_all_iterator(), Direction::Subject);
        let mut subjects: Vec<Value> = drain(&ctx, &mut it)
            .iter()
            .filter_map(|r| qs.name_of(r))
            .collect();
        subjects.sort();
        assert_eq!(subjects, vec![iri("a"), iri("a"), iri("c")]);
        it.close().unwrap();
    }

    #[test]
    fn contains_scans_quads_around_the_candidate() {
        let ctx = QueryContext::background();
        let qs = store();
        let p = qs.value_of(&iri("p")).unwrap();
        let trail: Box<dyn Iterator> = Box::new(LinksTo::new(
            qs.clone(),
            Box::new(Fixed::new(vec![p])),
            Direction::Predicate,
        ));
        let mut it = HasA::new(qs.clone(), trail, Direction::Subject);
        let a = qs.value_of(&iri("a")).unwrap();
        let b = qs.value_of(&iri("b")).unwrap();
        assert!(it.contains(&ctx, &a));
        assert_eq!(it.result(), Some(a.clone()));
        // b never stands in subject position
        assert!(!it.contains(&ctx, &b));
        it.reset();
        assert!(it.contains(&ctx, &a));
    }

    #[test]
    fn next_path_enumerates_other_accepting_quads() {
        let ctx = QueryContext::background();
        let qs = store();
        let b = qs.value_of(&iri("b")).unwrap();
        let dest: Box<dyn Iterator> = Box::new(LinksTo::new(
            qs.clone(),
            Box::new(Fixed::new(vec![b])),
            Direction::Object,
        ));
        let mut it = HasA::new(qs.clone(), dest, Direction::Subject);
        let a = qs.value_of(&iri("a")).unwrap();
        // a reaches b over two different edges
        assert!(it.contains(&ctx, &a));
        assert!(it.next_path(&ctx));
        assert!(!it.next_path(&ctx));
    }

    #[test]
    fn tags_apply_to_the_projected_node() {
        let ctx = QueryContext::background();
        let qs = store();
        let mut it = HasA::new(qs.clone(), qs.quads_all_iterator(), Direction::Object);
        it.tagger_mut().add("node");
        assert!(it.next(&ctx));
        let mut tags = TagMap::new();
        it.tag_results(&mut tags);
        assert_eq!(tags.get("node"), it.result().as_ref());
    }
}
