//! Lowering of path operators to iterator trees.

use crate::error::PathError;
use crate::path::{Path, PathOp};
use quiver_graph::iterate::{
    And, ApplyMorphism, Count, Fixed, HasA, Iterator, Limit, LinksTo, Not, Null, Optional, Or,
    Recursive, Save, Skip, Unique, ValueFilter,
};
use quiver_graph::StoreRef;
use quiver_model::{Direction, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// State threaded through one binding of a path: the active label scope and
/// the operators applied so far (consulted by `back`).
#[derive(Default)]
struct BuildCtx {
    labels: Option<Vec<Value>>,
    applied: Vec<PathOp>,
}

pub(crate) fn build(path: &Path, qs: &StoreRef) -> Result<Box<dyn Iterator>, PathError> {
    let mut ctx = BuildCtx::default();
    let seed: Box<dyn Iterator> = if path.rooted && !path.base.is_empty() {
        Box::new(fixed_for(qs, &path.base))
    } else {
        qs.nodes_all_iterator()
    };
    apply_all(&path.stack, qs, seed, &mut ctx)
}

fn apply_all(
    ops: &[PathOp],
    qs: &StoreRef,
    mut it: Box<dyn Iterator>,
    ctx: &mut BuildCtx,
) -> Result<Box<dyn Iterator>, PathError> {
    for op in ops {
        it = apply_one(op, qs, it, ctx)?;
    }
    Ok(it)
}

fn apply_one(
    op: &PathOp,
    qs: &StoreRef,
    it: Box<dyn Iterator>,
    ctx: &mut BuildCtx,
) -> Result<Box<dyn Iterator>, PathError> {
    // operators that splice other operator lists record those, not themselves
    match op {
        PathOp::Follow(p) => return apply_all(&p.stack, qs, it, ctx),
        PathOp::FollowReverse(p) => return apply_all(&reverse_ops(&p.stack), qs, it, ctx),
        PathOp::Back(name) => {
            let pos = ctx
                .applied
                .iter()
                .rposition(|o| matches!(o, PathOp::Tag(names) if names.iter().any(|n| n == name)));
            let Some(pos) = pos else {
                return Err(PathError::BadPath { tag: name.clone() });
            };
            let tail: Vec<PathOp> = ctx.applied[pos + 1..].to_vec();
            let reversed = reverse_ops(&tail);
            return apply_all(&reversed, qs, it, ctx);
        }
        _ => {}
    }
    let out: Box<dyn Iterator> = match op {
        PathOp::Is(nodes) => {
            if nodes.is_empty() {
                it
            } else {
                Box::new(And::new(vec![
                    it,
                    Box::new(fixed_for(qs, nodes)) as Box<dyn Iterator>,
                ]))
            }
        }
        PathOp::Out(preds) => out_links(qs, it, preds, &ctx.labels, false),
        PathOp::In(preds) => out_links(qs, it, preds, &ctx.labels, true),
        PathOp::Has { pred, nodes, rev } => has_links(qs, it, pred, nodes, *rev),
        PathOp::Intersect(p) => {
            let other = build(p, qs)?;
            Box::new(And::new(vec![it, other]))
        }
        PathOp::Union(p) => {
            let other = build(p, qs)?;
            Box::new(Or::new(vec![it, other]))
        }
        PathOp::FollowRecursive { path, max_depth } => {
            let mut known = HashSet::new();
            validate_fragment(&path.stack, &mut known).map_err(|tag| {
                PathError::UnresolvedTag { tag }
            })?;
            let fragment = path.clone();
            let morphism: ApplyMorphism = Arc::new(move |qs, input| {
                let mut ctx = BuildCtx::default();
                match apply_all(&fragment.stack, qs, input, &mut ctx) {
                    Ok(it) => it,
                    // validated above; a failure here yields nothing
                    Err(_) => Box::new(Null::new()),
                }
            });
            Box::new(Recursive::new(qs.clone(), it, morphism, *max_depth))
        }
        PathOp::Tag(names) => Box::new(Save::with_tags(it, names.clone())),
        PathOp::Save {
            pred,
            tag,
            rev,
            opt,
        } => save_links(qs, it, pred, tag.clone(), *rev, *opt),
        PathOp::Except(p) => {
            let other = build(p, qs)?;
            Box::new(Not::new(other, it))
        }
        PathOp::Unique => Box::new(Unique::new(it)),
        PathOp::Count => Box::new(Count::new(it)),
        PathOp::Limit(n) => Box::new(Limit::new(it, *n)),
        PathOp::Skip(n) => Box::new(Skip::new(it, *n)),
        PathOp::Labels(labels) => {
            ctx.labels = if labels.is_empty() {
                None
            } else {
                Some(labels.clone())
            };
            it
        }
        PathOp::Filter { op: cmp, value } => {
            Box::new(ValueFilter::comparison(qs.clone(), it, *cmp, value.clone()))
        }
        PathOp::Regex { re, refs } => Box::new(ValueFilter::regex(qs.clone(), it, re.clone(), *refs)),
        PathOp::Follow(_) | PathOp::FollowReverse(_) | PathOp::Back(_) => unreachable!(),
    };
    ctx.applied.push(op.clone());
    Ok(out)
}

/// Resolves values against the store; values the store never saw resolve to
/// nothing, which collapses the fragment to an empty set.
fn fixed_for(qs: &StoreRef, values: &[Value]) -> Fixed {
    Fixed::new(values.iter().filter_map(|v| qs.value_of(v)).collect())
}

/// `Fixed(preds) → LinksTo(Predicate) ∧ LinksTo(start) [∧ LinksTo(Label)] →
/// HasA(goal)`: the quads leaving the current nodes over the given
/// predicates, projected onto the far endpoint.
fn out_links(
    qs: &StoreRef,
    input: Box<dyn Iterator>,
    preds: &[Value],
    labels: &Option<Vec<Value>>,
    reverse: bool,
) -> Box<dyn Iterator> {
    let (start, goal) = if reverse {
        (Direction::Object, Direction::Subject)
    } else {
        (Direction::Subject, Direction::Object)
    };
    let mut route: Vec<Box<dyn Iterator>> = Vec::new();
    if !preds.is_empty() {
        let preds_it: Box<dyn Iterator> = Box::new(fixed_for(qs, preds));
        route.push(Box::new(LinksTo::new(
            qs.clone(),
            preds_it,
            Direction::Predicate,
        )));
    }
    route.push(Box::new(LinksTo::new(qs.clone(), input, start)));
    if let Some(labels) = labels {
        let labels_it: Box<dyn Iterator> = Box::new(fixed_for(qs, labels));
        route.push(Box::new(LinksTo::new(
            qs.clone(),
            labels_it,
            Direction::Label,
        )));
    }
    let route_it = join(route);
    Box::new(HasA::new(qs.clone(), route_it, goal))
}

fn has_links(
    qs: &StoreRef,
    input: Box<dyn Iterator>,
    pred: &Value,
    nodes: &[Value],
    rev: bool,
) -> Box<dyn Iterator> {
    let (start, goal) = if rev {
        (Direction::Object, Direction::Subject)
    } else {
        (Direction::Subject, Direction::Object)
    };
    let preds_it: Box<dyn Iterator> = Box::new(fixed_for(qs, std::slice::from_ref(pred)));
    let mut route: Vec<Box<dyn Iterator>> = vec![Box::new(LinksTo::new(
        qs.clone(),
        preds_it,
        Direction::Predicate,
    ))];
    if !nodes.is_empty() {
        let nodes_it: Box<dyn Iterator> = Box::new(fixed_for(qs, nodes));
        route.push(Box::new(LinksTo::new(qs.clone(), nodes_it, goal)));
    }
    let hasa: Box<dyn Iterator> = Box::new(HasA::new(qs.clone(), join(route), start));
    Box::new(And::new(vec![input, hasa]))
}

fn save_links(
    qs: &StoreRef,
    input: Box<dyn Iterator>,
    pred: &Value,
    tag: String,
    rev: bool,
    opt: bool,
) -> Box<dyn Iterator> {
    let (start, goal) = if rev {
        (Direction::Object, Direction::Subject)
    } else {
        (Direction::Subject, Direction::Object)
    };
    let saved: Box<dyn Iterator> = Box::new(Save::new(qs.nodes_all_iterator(), tag));
    let dest: Box<dyn Iterator> = Box::new(LinksTo::new(qs.clone(), saved, goal));
    let preds_it: Box<dyn Iterator> = Box::new(fixed_for(qs, std::slice::from_ref(pred)));
    let trail: Box<dyn Iterator> = Box::new(LinksTo::new(qs.clone(), preds_it, Direction::Predicate));
    let hasa: Box<dyn Iterator> =
        Box::new(HasA::new(qs.clone(), join(vec![trail, dest]), start));
    let constraint: Box<dyn Iterator> = if opt {
        Box::new(Optional::new(hasa))
    } else {
        hasa
    };
    Box::new(And::new(vec![input, constraint]))
}

fn join(mut route: Vec<Box<dyn Iterator>>) -> Box<dyn Iterator> {
    if route.len() == 1 {
        route.pop().expect("one entry")
    } else {
        Box::new(And::new(route))
    }
}

/// Every operator reversed, in reverse order; traversal operators swap
/// direction, constraints and tags stay in place.
pub(crate) fn reverse_ops(ops: &[PathOp]) -> Vec<PathOp> {
    ops.iter().rev().map(reverse_op).collect()
}

fn reverse_op(op: &PathOp) -> PathOp {
    match op {
        PathOp::Out(preds) => PathOp::In(preds.clone()),
        PathOp::In(preds) => PathOp::Out(preds.clone()),
        PathOp::Follow(p) => PathOp::FollowReverse(p.clone()),
        PathOp::FollowReverse(p) => PathOp::Follow(p.clone()),
        op => op.clone(),
    }
}

/// Checks that every `back` in a detached fragment resolves to a tag the
/// fragment itself placed. Returns the offending tag on failure.
fn validate_fragment(ops: &[PathOp], known: &mut HashSet<String>) -> Result<(), String> {
    for op in ops {
        match op {
            PathOp::Tag(names) => known.extend(names.iter().cloned()),
            PathOp::Back(name) => {
                if !known.contains(name) {
                    return Err(name.clone());
                }
            }
            PathOp::Follow(p) | PathOp::FollowReverse(p) => {
                validate_fragment(&p.stack, known)?;
            }
            PathOp::Intersect(p)
            | PathOp::Union(p)
            | PathOp::Except(p)
            | PathOp::FollowRecursive { path: p, .. } => {
                let mut scoped = HashSet::new();
                validate_fragment(&p.stack, &mut scoped)?;
            }
            _ => {}
        }
    }
    Ok(())
}
