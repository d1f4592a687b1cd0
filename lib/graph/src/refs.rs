use quiver_model::Value;

/// A store's opaque handle for a node or a quad.
///
/// Identity is structural: two refs denote the same entry iff they compare
/// equal, and refs are only comparable within the store that minted them.
/// [`Ref::PreFetched`] carries a literal value so iterators can produce
/// results that have no backing store entry (counts, fixed sets).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ref {
    /// An interned integer id.
    Id(u64),
    /// An opaque backend key.
    Key(Box<[u8]>),
    /// A value carried inline, resolvable without the store.
    PreFetched(Value),
}

impl Ref {
    pub fn pre_fetched(v: impl Into<Value>) -> Self {
        Ref::PreFetched(v.into())
    }

    /// The inline value of a pre-fetched ref.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Ref::PreFetched(v) => Some(v),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<u64> {
        match self {
            Ref::Id(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<Value> for Ref {
    fn from(v: Value) -> Self {
        Ref::PreFetched(v)
    }
}
