use crate::context::QueryContext;
use crate::error::StoreError;
use crate::iterate::{Iterator, Kind, Null, Size, Stats, TagMap, Tagger};
use crate::quadstore::StoreRef;
use crate::refs::Ref;
use quiver_model::Value;
use std::any::Any;
use std::cmp::Ordering;

/// Ordering operator of a comparison filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    fn accepts(self, ord: Ordering) -> bool {
        match self {
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Lte => ord != Ordering::Greater,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Gte => ord != Ordering::Less,
        }
    }
}

#[derive(Debug)]
enum Filter {
    Regex {
        re: regex::Regex,
        /// Also match IRIs and blank node names, not only string literals.
        refs: bool,
    },
    Comparison {
        op: CompareOp,
        value: Value,
    },
}

/// Filters a node iterator by the resolved value of each candidate.
///
/// Every check resolves the candidate through the store's `name_of`, so this
/// sits late in a tree, after cheaper constraints have pruned it.
#[derive(Debug)]
pub struct ValueFilter {
    qs: StoreRef,
    child: Box<dyn Iterator>,
    filter: Filter,
    tagger: Tagger,
}

impl ValueFilter {
    /// Keeps string-valued results matching `re`. With `refs`, IRIs and
    /// blank nodes are matched by their textual names as well.
    pub fn regex(qs: StoreRef, child: Box<dyn Iterator>, re: regex::Regex, refs: bool) -> Self {
        ValueFilter {
            qs,
            child,
            filter: Filter::Regex { re, refs },
            tagger: Tagger::default(),
        }
    }

    /// Keeps results whose value compares to `value` under `op`.
    pub fn comparison(qs: StoreRef, child: Box<dyn Iterator>, op: CompareOp, value: Value) -> Self {
        ValueFilter {
            qs,
            child,
            filter: Filter::Comparison { op, value },
            tagger: Tagger::default(),
        }
    }

    fn passes(&self, r: &Ref) -> bool {
        let Some(v) = self.qs.name_of(r) else {
            return false;
        };
        match &self.filter {
            Filter::Regex { re, refs } => match &v {
                Value::Str(s)
                | Value::TypedStr { value: s, .. }
                | Value::LangStr { value: s, .. } => re.is_match(s),
                Value::Iri(iri) if *refs => re.is_match(iri.as_str()),
                Value::BlankNode(b) if *refs => re.is_match(b.as_str()),
                _ => false,
            },
            Filter::Comparison { op, value } => match compare(&v, value) {
                Some(ord) => op.accepts(ord),
                None => false,
            },
        }
    }
}

/// Same-kind value comparison; numbers compare across int/float.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Int(x), Value::Float(y)) => (*x as f64).partial_cmp(y),
        (Value::Float(x), Value::Int(y)) => x.partial_cmp(&(*y as f64)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        (Value::TypedStr { value: x, .. }, Value::Str(y)) => Some(x.as_str().cmp(y)),
        (Value::LangStr { value: x, .. }, Value::Str(y)) => Some(x.as_str().cmp(y)),
        (Value::DateTime(x), Value::DateTime(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

impl Iterator for ValueFilter {
    fn kind(&self) -> Kind {
        match self.filter {
            Filter::Regex { .. } => Kind::Regex,
            Filter::Comparison { .. } => Kind::Comparison,
        }
    }

    fn next(&mut self, ctx: &QueryContext) -> bool {
        while self.child.next(ctx) {
            if ctx.is_done() {
                return false;
            }
            let Some(r) = self.child.result() else {
                continue;
            };
            if self.passes(&r) {
                return true;
            }
        }
        false
    }

    fn result(&self) -> Option<Ref> {
        self.child.result()
    }

    fn next_path(&mut self, ctx: &QueryContext) -> bool {
        self.child.next_path(ctx)
    }

    fn contains(&mut self, ctx: &QueryContext, v: &Ref) -> bool {
        self.passes(v) && self.child.contains(ctx, v)
    }

    fn reset(&mut self) {
        self.child.reset();
    }

    fn tag_results(&self, dst: &mut TagMap) {
        if let Some(r) = self.child.result() {
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
        let child = self.child.stats();
        Stats {
            contains_cost: child.contains_cost + 1,
            next_cost: child.next_cost + 1,
            size: Size::approx((child.size.value / 2).max(1)),
        }
    }

    fn optimize(self: Box<Self>) -> (Box<dyn Iterator>, bool) {
        let this = *self;
        let ValueFilter {
            qs,
            child,
            filter,
            tagger,
        } = this;
        let (child, changed) = child.optimize();
        if child.kind() == Kind::Null {
            return (Box::new(Null::new()), true);
        }
        let it = ValueFilter {
            qs,
            child,
            filter,
            tagger,
        };
        (Box::new(it), changed)
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
    use crate::graphmock::GraphMock;
    use crate::iterate::{drain, Fixed};
    use quiver_model::iri;

    fn pre_fetched(values: Vec<Value>) -> Box<dyn Iterator> {
        Box::new(Fixed::new(values.into_iter().map(Ref::PreFetched).collect()))
    }

    #[test]
    fn comparison_keeps_matching_values() {
        let ctx = QueryContext::background();
        let qs = GraphMock::shared([]);
        let child = pre_fetched(vec![Value::Int(2), Value::Int(5), Value::Int(9)]);
        let mut it = ValueFilter::comparison(qs, child, CompareOp::Gte, Value::Int(5));
        assert_eq!(
            drain(&ctx, &mut it),
            vec![
                Ref::PreFetched(Value::Int(5)),
                Ref::PreFetched(Value::Int(9)),
            ]
        );
        it.close().unwrap();
    }

    #[test]
    fn comparison_contains_applies_the_same_predicate() {
        let ctx = QueryContext::background();
        let qs = GraphMock::shared([]);
        let child = pre_fetched(vec![Value::Int(2), Value::Int(9), Value::from("nine")]);
        let mut it = ValueFilter::comparison(qs, child, CompareOp::Gt, Value::Int(5));
        assert!(it.contains(&ctx, &Ref::PreFetched(Value::Int(9))));
        assert!(!it.contains(&ctx, &Ref::PreFetched(Value::Int(2))));
        // mismatched kinds never compare
        assert!(!it.contains(&ctx, &Ref::PreFetched(Value::from("nine"))));
    }

    #[test]
    fn numbers_compare_across_int_and_float() {
        let ctx = QueryContext::background();
        let qs = GraphMock::shared([]);
        let child = pre_fetched(vec![Value::Float(4.5), Value::Float(6.5)]);
        let mut it = ValueFilter::comparison(qs, child, CompareOp::Lt, Value::Int(5));
        assert_eq!(
            drain(&ctx, &mut it),
            vec![Ref::PreFetched(Value::Float(4.5))]
        );
    }

    #[test]
    fn regex_matches_only_strings_by_default() {
        let ctx = QueryContext::background();
        let qs = GraphMock::shared([]);
        let re = regex::Regex::new("^a").unwrap();
        let values = vec![Value::from("alpha"), Value::from("beta"), iri("aleph")];

        let mut it = ValueFilter::regex(qs.clone(), pre_fetched(values.clone()), re.clone(), false);
        assert_eq!(
            drain(&ctx, &mut it),
            vec![Ref::PreFetched(Value::from("alpha"))]
        );

        let mut with_refs = ValueFilter::regex(qs, pre_fetched(values), re, true);
        assert_eq!(
            drain(&ctx, &mut with_refs),
            vec![
                Ref::PreFetched(Value::from("alpha")),
                Ref::PreFetched(iri("aleph")),
            ]
        );
    }

    #[test]
    fn reset_replays_the_filtered_set() {
        let ctx = QueryContext::background();
        let qs = GraphMock::shared([]);
        let child = pre_fetched(vec![Value::Int(1), Value::Int(7)]);
        let mut it = ValueFilter::comparison(qs, child, CompareOp::Gt, Value::Int(3));
        let first = drain(&ctx, &mut it);
        it.reset();
        let second = drain(&ctx, &mut it);
        assert_eq!(first, vec![Ref::PreFetched(Value::Int(7))]);
        assert_eq!(first, second);
    }
}
