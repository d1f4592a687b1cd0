use crate::voc;
use chrono::{DateTime, SecondsFormat, Utc};
use rand::RngCore;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An IRI node name, either in full or in namespace-short form.
///
/// Compaction and expansion against the registered namespaces are explicit:
/// `<http://example.org/name>` and `ex:name` are distinct values until one of
/// them is normalized with [`Iri::short`] or [`Iri::full`].
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Iri(String);

impl Iri {
    pub fn new(iri: impl Into<String>) -> Self {
        Iri(iri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Compacts the IRI against the global namespace registry.
    pub fn short(&self) -> Iri {
        Iri(voc::short_iri(&self.0))
    }

    /// Expands the IRI against the global namespace registry.
    pub fn full(&self) -> Iri {
        Iri(voc::full_iri(&self.0))
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

impl From<&str> for Iri {
    fn from(s: &str) -> Self {
        Iri(s.to_owned())
    }
}

impl From<String> for Iri {
    fn from(s: String) -> Self {
        Iri(s)
    }
}

/// A node with only local identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlankNode(String);

impl BlankNode {
    pub fn new(id: impl Into<String>) -> Self {
        BlankNode(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generates a blank node with a random hex identifier.
    pub fn random() -> Self {
        let mut buf = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut buf);
        let mut id = String::with_capacity(2 + buf.len() * 2);
        id.push_str("b");
        for b in buf {
            id.push_str(&format!("{b:02x}"));
        }
        BlankNode(id)
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

impl From<&str> for BlankNode {
    fn from(s: &str) -> Self {
        BlankNode(s.to_owned())
    }
}

/// A typed graph node value.
///
/// `Value` implements a total equality and ordering so it can serve as a map
/// key throughout the query engine; floats are identified by their bit
/// pattern.
#[derive(Clone, Debug)]
pub enum Value {
    Iri(Iri),
    BlankNode(BlankNode),
    /// A plain string literal.
    Str(String),
    /// A literal with an explicit datatype IRI.
    TypedStr { value: String, datatype: Iri },
    /// A literal with a BCP-47 language tag.
    LangStr { value: String, lang: String },
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(DateTime<Utc>),
}

impl Value {
    /// Returns the IRI of an IRI value.
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Value::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            Value::TypedStr { value, .. } | Value::LangStr { value, .. } => Some(value),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Iri(_) => 0,
            Value::BlankNode(_) => 1,
            Value::Str(_) => 2,
            Value::TypedStr { .. } => 3,
            Value::LangStr { .. } => 4,
            Value::Int(_) => 5,
            Value::Float(_) => 6,
            Value::Bool(_) => 7,
            Value::DateTime(_) => 8,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Iri(a), Value::Iri(b)) => a == b,
            (Value::BlankNode(a), Value::BlankNode(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (
                Value::TypedStr { value: a, datatype: da },
                Value::TypedStr { value: b, datatype: db },
            ) => a == b && da == db,
            (
                Value::LangStr { value: a, lang: la },
                Value::LangStr { value: b, lang: lb },
            ) => a == b && la == lb,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.rank());
        match self {
            Value::Iri(iri) => iri.hash(state),
            Value::BlankNode(b) => b.hash(state),
            Value::Str(s) => s.hash(state),
            Value::TypedStr { value, datatype } => {
                value.hash(state);
                datatype.hash(state);
            }
            Value::LangStr { value, lang } => {
                value.hash(state);
                lang.hash(state);
            }
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::DateTime(t) => t.hash(state),
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Iri(a), Value::Iri(b)) => a.cmp(b),
            (Value::BlankNode(a), Value::BlankNode(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (
                Value::TypedStr { value: a, datatype: da },
                Value::TypedStr { value: b, datatype: db },
            ) => a.cmp(b).then_with(|| da.cmp(db)),
            (
                Value::LangStr { value: a, lang: la },
                Value::LangStr { value: b, lang: lb },
            ) => a.cmp(b).then_with(|| la.cmp(lb)),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn escape_str(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Iri(iri) => write!(f, "{iri}"),
            Value::BlankNode(b) => write!(f, "{b}"),
            Value::Str(s) => escape_str(f, s),
            Value::TypedStr { value, datatype } => {
                escape_str(f, value)?;
                write!(f, "^^{datatype}")
            }
            Value::LangStr { value, lang } => {
                escape_str(f, value)?;
                write!(f, "@{lang}")
            }
            Value::Int(i) => write!(f, "\"{i}\"^^<{}integer>", voc::xsd::NS),
            Value::Float(x) => write!(f, "\"{x:E}\"^^<{}double>", voc::xsd::NS),
            Value::Bool(b) => {
                let s = if *b { "True" } else { "False" };
                write!(f, "\"{s}\"^^<{}boolean>", voc::xsd::NS)
            }
            Value::DateTime(t) => write!(
                f,
                "\"{}\"^^<{}dateTime>",
                t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                voc::xsd::NS
            ),
        }
    }
}

impl From<Iri> for Value {
    fn from(v: Iri) -> Self {
        Value::Iri(v)
    }
}

impl From<BlankNode> for Value {
    fn from(v: BlankNode) -> Self {
        Value::BlankNode(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

/// Shorthand for an IRI value.
pub fn iri(s: impl Into<String>) -> Value {
    Value::Iri(Iri::new(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voc::{self, Namespace};
    use std::collections::HashSet;

    #[test]
    fn float_identity_is_total() {
        let nan = Value::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));

        let mut set = HashSet::new();
        set.insert(Value::Float(1.5));
        assert!(set.contains(&Value::Float(1.5)));
        assert!(!set.contains(&Value::Float(2.5)));
    }

    #[test]
    fn kinds_never_compare_equal() {
        assert_ne!(Value::Str("1".into()), Value::Int(1));
        assert_ne!(iri("a"), Value::Str("a".into()));
        assert_ne!(
            Value::BlankNode(BlankNode::new("a")),
            Value::Str("a".into())
        );
    }

    #[test]
    fn short_and_full_are_explicit() {
        voc::register(Namespace {
            prefix: "exv:".into(),
            full: "http://example.org/value/".into(),
        });
        let full = Iri::new("http://example.org/value/name");
        let short = Iri::new("exv:name");
        assert_ne!(full, short);
        assert_eq!(full.short(), short);
        assert_eq!(short.full(), full);
    }

    #[test]
    fn random_blank_nodes_differ() {
        assert_ne!(BlankNode::random(), BlankNode::random());
    }
}
