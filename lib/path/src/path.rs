use crate::apply;
use crate::error::PathError;
use quiver_graph::iterate::{CompareOp, Iterator};
use quiver_graph::StoreRef;
use quiver_model::Value;

/// A single traversal operator. Operators are applied left to right against
/// the path's seed iterator when the path is bound to a store.
#[derive(Clone, Debug)]
pub(crate) enum PathOp {
    /// Restrict the current nodes to the given set.
    Is(Vec<Value>),
    /// Follow the given predicates forward; empty means any predicate.
    Out(Vec<Value>),
    /// Follow the given predicates backward.
    In(Vec<Value>),
    /// Keep nodes that have an edge of `pred` to one of `nodes` (any node if
    /// empty), in the given direction.
    Has {
        pred: Value,
        nodes: Vec<Value>,
        rev: bool,
    },
    /// Intersect with another path evaluated from the same root.
    Intersect(Path),
    /// Union with another path evaluated from the same root.
    Union(Path),
    /// Apply another path's operators inline.
    Follow(Path),
    /// Apply another path's operators inline, reversed.
    FollowReverse(Path),
    /// Apply a morphism to a fixed point, bounded by `max_depth` (a
    /// non-positive bound means unbounded).
    FollowRecursive { path: Path, max_depth: i32 },
    /// Tag the current position.
    Tag(Vec<String>),
    /// Record the value at the end of a `pred` edge under `tag` without
    /// moving the cursor.
    Save {
        pred: Value,
        tag: String,
        rev: bool,
        opt: bool,
    },
    /// Remove the other path's nodes from the current set.
    Except(Path),
    Unique,
    Count,
    Limit(i64),
    Skip(i64),
    /// Rewind the cursor to a previously tagged position.
    Back(String),
    /// Restrict subsequent traversal to edges labeled with one of the given
    /// values; empty clears the restriction.
    Labels(Vec<Value>),
    /// Keep nodes whose value compares to `value` under `op`.
    Filter { op: CompareOp, value: Value },
    /// Keep nodes whose string value matches the pattern. With `refs`, IRIs
    /// and blank nodes match by name too.
    Regex { re: regex::Regex, refs: bool },
}

/// An immutable traversal description.
///
/// A rooted path (see [`start_path`]) carries its starting node set; an
/// unrooted one (see [`start_morphism`]) is a reusable fragment evaluated
/// from all nodes, or wherever it is inlined with [`Path::follow`].
#[derive(Clone, Debug, Default)]
pub struct Path {
    pub(crate) stack: Vec<PathOp>,
    pub(crate) base: Vec<Value>,
    pub(crate) rooted: bool,
}

/// A path rooted at the given nodes; empty means "all nodes".
pub fn start_path(nodes: impl IntoIterator<Item = Value>) -> Path {
    Path {
        stack: Vec::new(),
        base: nodes.into_iter().collect(),
        rooted: true,
    }
}

/// An unrooted, reusable path.
pub fn start_morphism() -> Path {
    Path::default()
}

impl Path {
    fn push(mut self, op: PathOp) -> Path {
        self.stack.push(op);
        self
    }

    /// Restricts the current nodes to the given set.
    pub fn is(self, nodes: impl IntoIterator<Item = Value>) -> Path {
        self.push(PathOp::Is(nodes.into_iter().collect()))
    }

    /// Follows the given predicates from subject to object.
    pub fn out(self, preds: impl IntoIterator<Item = Value>) -> Path {
        self.push(PathOp::Out(preds.into_iter().collect()))
    }

    /// Follows the given predicates from object to subject.
    pub fn in_(self, preds: impl IntoIterator<Item = Value>) -> Path {
        self.push(PathOp::In(preds.into_iter().collect()))
    }

    /// Keeps nodes with a forward `pred` edge to one of `nodes` (to anything,
    /// if empty).
    pub fn has(self, pred: impl Into<Value>, nodes: impl IntoIterator<Item = Value>) -> Path {
        self.push(PathOp::Has {
            pred: pred.into(),
            nodes: nodes.into_iter().collect(),
            rev: false,
        })
    }

    /// Keeps nodes with a backward `pred` edge from one of `nodes`.
    pub fn has_reverse(
        self,
        pred: impl Into<Value>,
        nodes: impl IntoIterator<Item = Value>,
    ) -> Path {
        self.push(PathOp::Has {
            pred: pred.into(),
            nodes: nodes.into_iter().collect(),
            rev: true,
        })
    }

    /// Intersects with `p`, evaluated from the same root.
    pub fn and(self, p: Path) -> Path {
        self.push(PathOp::Intersect(p))
    }

    /// Unions with `p`, evaluated from the same root.
    pub fn or(self, p: Path) -> Path {
        self.push(PathOp::Union(p))
    }

    /// Applies the operators of `p` inline.
    pub fn follow(self, p: Path) -> Path {
        self.push(PathOp::Follow(p))
    }

    /// Applies the operators of `p` inline, reversed.
    pub fn follow_reverse(self, p: Path) -> Path {
        self.push(PathOp::FollowReverse(p))
    }

    /// Applies `p` repeatedly until no new nodes appear, or `max_depth`
    /// applications were done (non-positive means unbounded).
    pub fn follow_recursive(self, p: Path, max_depth: i32) -> Path {
        self.push(PathOp::FollowRecursive {
            path: p,
            max_depth,
        })
    }

    /// Tags the current position.
    pub fn tag(self, name: impl Into<String>) -> Path {
        self.push(PathOp::Tag(vec![name.into()]))
    }

    pub fn tag_all(self, names: impl IntoIterator<Item = String>) -> Path {
        self.push(PathOp::Tag(names.into_iter().collect()))
    }

    /// Saves the value at the end of a forward `pred` edge under `tag`.
    pub fn save(self, pred: impl Into<Value>, tag: impl Into<String>) -> Path {
        self.push(PathOp::Save {
            pred: pred.into(),
            tag: tag.into(),
            rev: false,
            opt: false,
        })
    }

    pub fn save_reverse(self, pred: impl Into<Value>, tag: impl Into<String>) -> Path {
        self.push(PathOp::Save {
            pred: pred.into(),
            tag: tag.into(),
            rev: true,
            opt: false,
        })
    }

    /// Like [`Path::save`], but nodes without the edge still match, with a
    /// null binding.
    pub fn save_optional(self, pred: impl Into<Value>, tag: impl Into<String>) -> Path {
        self.push(PathOp::Save {
            pred: pred.into(),
            tag: tag.into(),
            rev: false,
            opt: true,
        })
    }

    pub fn save_optional_reverse(self, pred: impl Into<Value>, tag: impl Into<String>) -> Path {
        self.push(PathOp::Save {
            pred: pred.into(),
            tag: tag.into(),
            rev: true,
            opt: true,
        })
    }

    /// Removes the nodes of `p` from the current set.
    pub fn except(self, p: Path) -> Path {
        self.push(PathOp::Except(p))
    }

    pub fn unique(self) -> Path {
        self.push(PathOp::Unique)
    }

    /// Collapses the path to a single count result.
    pub fn count(self) -> Path {
        self.push(PathOp::Count)
    }

    pub fn limit(self, n: i64) -> Path {
        self.push(PathOp::Limit(n))
    }

    pub fn skip(self, n: i64) -> Path {
        self.push(PathOp::Skip(n))
    }

    /// Rewinds the cursor to the position tagged `name`, keeping all
    /// constraints added since.
    pub fn back(self, name: impl Into<String>) -> Path {
        self.push(PathOp::Back(name.into()))
    }

    /// Restricts subsequent traversal to edges with one of the given labels;
    /// an empty set clears the restriction.
    pub fn labels(self, labels: impl IntoIterator<Item = Value>) -> Path {
        self.push(PathOp::Labels(labels.into_iter().collect()))
    }

    /// Keeps nodes whose value compares to `value` under `op`.
    pub fn filter(self, op: CompareOp, value: impl Into<Value>) -> Path {
        self.push(PathOp::Filter {
            op,
            value: value.into(),
        })
    }

    /// Keeps nodes with a string value matching `re`.
    pub fn regex(self, re: regex::Regex) -> Path {
        self.push(PathOp::Regex { re, refs: false })
    }

    /// Like [`Path::regex`], but IRIs and blank nodes match by name too.
    pub fn regex_with_refs(self, re: regex::Regex) -> Path {
        self.push(PathOp::Regex { re, refs: true })
    }

    /// Binds the path to a store, producing an unoptimized iterator tree.
    /// Structural errors (an unknown [`Path::back`] tag) surface here.
    pub fn build_iterator(&self, qs: &StoreRef) -> Result<Box<dyn Iterator>, PathError> {
        apply::build(self, qs)
    }

    /// Binds the path to a store and runs the rewrite passes over the tree.
    pub fn build_iterator_optimized(
        &self,
        qs: &StoreRef,
    ) -> Result<Box<dyn Iterator>, PathError> {
        let it = apply::build(self, qs)?;
        Ok(quiver_graph::iterate::optimize(qs, it))
    }

    /// The reversed description: every operator reversed, in reverse order.
    pub fn reverse(&self) -> Path {
        Path {
            stack: apply::reverse_ops(&self.stack),
            base: self.base.clone(),
            rooted: self.rooted,
        }
    }
}
