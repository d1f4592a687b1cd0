//! The composable lazy-set iterator algebra.
//!
//! Every iterator is a stateful generator over [`Ref`]s with one current
//! result at a time. Trees are built bottom-up against a [`StoreRef`] and
//! driven from the root: [`Iterator::next`] advances to the next result,
//! [`Iterator::next_path`] enumerates alternative tag bindings for the same
//! result, and [`Iterator::contains`] answers membership without a full
//! scan. [`optimize`] rewrites a tree into an observationally equivalent,
//! cheaper one.

use crate::context::QueryContext;
use crate::error::StoreError;
use crate::quadstore::StoreRef;
use crate::refs::Ref;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

mod and;
mod count;
mod fixed;
mod hasa;
mod limit;
mod linksto;
mod materialize;
mod not;
mod null;
mod optional;
mod or;
mod recursive;
mod save;
mod skip;
mod unique;
mod value_filter;

pub use and::And;
pub use count::Count;
pub use fixed::Fixed;
pub use hasa::HasA;
pub use limit::Limit;
pub use linksto::LinksTo;
pub use materialize::Materialize;
pub use not::Not;
pub use null::Null;
pub use optional::Optional;
pub use or::Or;
pub use recursive::Recursive;
pub use save::Save;
pub use skip::Skip;
pub use unique::Unique;
pub use value_filter::{CompareOp, ValueFilter};

/// Variant tag used by the optimizer and for error decoration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Null,
    Fixed,
    And,
    Or,
    Not,
    HasA,
    LinksTo,
    Save,
    Optional,
    Count,
    Limit,
    Skip,
    Unique,
    Materialize,
    Regex,
    Comparison,
    Recursive,
    /// A store-provided all-nodes or all-quads iterator.
    All,
    /// A backend-specialized iterator.
    Custom(&'static str),
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Custom(name) => f.write_str(name),
            kind => write!(f, "{}", format!("{kind:?}").to_lowercase()),
        }
    }
}

/// A size estimate: how many results, and whether the number is exact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Size {
    pub value: i64,
    pub exact: bool,
}

impl Size {
    pub fn exact(value: i64) -> Self {
        Size { value, exact: true }
    }

    pub fn approx(value: i64) -> Self {
        Size { value, exact: false }
    }
}

/// Cost and cardinality estimates for one iterator.
#[derive(Clone, Copy, Debug, Default)]
pub struct Stats {
    pub contains_cost: i64,
    pub next_cost: i64,
    pub size: Size,
}

/// Tag bindings harvested from one result: tag name to bound ref.
pub type TagMap = HashMap<String, Ref>;

/// Tags attached to an iterator's current-result position.
#[derive(Clone, Debug, Default)]
pub struct Tagger {
    tags: Vec<String>,
    fixed: Vec<(String, Ref)>,
}

impl Tagger {
    /// Adds a tag bound to the current result.
    pub fn add(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Adds a tag bound to a constant ref.
    pub fn add_fixed(&mut self, tag: impl Into<String>, value: Ref) {
        self.fixed.push((tag.into(), value));
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn fixed(&self) -> &[(String, Ref)] {
        &self.fixed
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.fixed.is_empty()
    }

    /// Merges all tags of `other` into this tagger.
    pub fn copy_from(&mut self, other: &Tagger) {
        for tag in &other.tags {
            self.add(tag.clone());
        }
        for (tag, value) in &other.fixed {
            self.fixed.push((tag.clone(), value.clone()));
        }
    }

    /// Writes this tagger's bindings for the result `v` into `dst`.
    pub fn tag_result(&self, dst: &mut TagMap, v: &Ref) {
        for tag in &self.tags {
            dst.insert(tag.clone(), v.clone());
        }
        for (tag, value) in &self.fixed {
            dst.insert(tag.clone(), value.clone());
        }
    }
}

/// A stateful lazy set generator over [`Ref`]s.
///
/// The contract mirrors the rest of the engine's expectations:
///
/// - after a successful [`next`](Iterator::next) there is exactly one current
///   [`result`](Iterator::result);
/// - [`next_path`](Iterator::next_path) produces alternative tag bindings for
///   the *same* result until it fails;
/// - [`reset`](Iterator::reset) restores the initial state;
/// - [`optimize`](Iterator::optimize) returns an observationally equivalent
///   iterator and whether a replacement took place;
/// - iterators are closed on all exit paths; closing cascades to children and
///   deferred errors stay readable through [`err`](Iterator::err).
pub trait Iterator: fmt::Debug {
    fn kind(&self) -> Kind;

    /// Advances to the next result. Returns `false` when exhausted or failed;
    /// the cause of a failure is readable via [`err`](Iterator::err).
    fn next(&mut self, ctx: &QueryContext) -> bool;

    /// The current result; meaningless before the first successful advance.
    fn result(&self) -> Option<Ref>;

    /// Advances to the next alternative binding for the current result.
    fn next_path(&mut self, ctx: &QueryContext) -> bool;

    /// Membership check; may reposition internal state.
    fn contains(&mut self, ctx: &QueryContext, v: &Ref) -> bool;

    /// Restarts from the initial state, clearing tag bindings.
    fn reset(&mut self);

    /// Snapshots the current tag bindings into `dst`.
    fn tag_results(&self, dst: &mut TagMap);

    fn tagger(&self) -> &Tagger;

    fn tagger_mut(&mut self) -> &mut Tagger;

    fn stats(&self) -> Stats;

    /// Returns an observationally equivalent iterator (same result multiset,
    /// same tag bindings) and whether this tree was replaced.
    fn optimize(self: Box<Self>) -> (Box<dyn Iterator>, bool);

    /// Children, for introspection.
    fn sub_iterators(&self) -> Vec<&dyn Iterator> {
        Vec::new()
    }

    /// Terminates the iterator, cascading to children.
    fn close(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    /// A deferred error, if iteration failed.
    fn err(&self) -> Option<&StoreError> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// A reusable traversal fragment: maps an input node iterator to the nodes
/// reachable from it. Used by [`Recursive`] to re-apply a traversal to each
/// new frontier.
pub type ApplyMorphism = Arc<dyn Fn(&StoreRef, Box<dyn Iterator>) -> Box<dyn Iterator> + Send + Sync>;

/// Upper bound on optimize passes; each pass is a full depth-first rewrite,
/// and the loop stops early once a pass reports no replacement.
const MAX_OPTIMIZE_PASSES: usize = 4;

/// Rewrites `it` to a fixed point and then lets the store substitute a
/// backend-specialized iterator.
pub fn optimize(qs: &StoreRef, mut it: Box<dyn Iterator>) -> Box<dyn Iterator> {
    for _ in 0..MAX_OPTIMIZE_PASSES {
        let (next, changed) = it.optimize();
        it = next;
        if !changed {
            break;
        }
    }
    let (it, replaced) = qs.optimize_iterator(it);
    if replaced {
        tracing::debug!(kind = %it.kind(), "store substituted a specialized iterator");
    }
    it
}

/// Drains `it`, returning every result ref in encounter order.
pub fn drain(ctx: &QueryContext, it: &mut dyn Iterator) -> Vec<Ref> {
    let mut out = Vec::new();
    while it.next(ctx) {
        if let Some(r) = it.result() {
            out.push(r);
        }
    }
    out
}
