//! Registry of namespace prefixes and the well-known vocabularies.
//!
//! IRIs can be written in full (`http://www.w3.org/1999/02/22-rdf-syntax-ns#type`)
//! or in short form (`rdf:type`). The registry maps between the two; the
//! conversion itself is always explicit, see [`crate::Iri::short`] and
//! [`crate::Iri::full`].

use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};

/// A single prefix registration, e.g. `rdf:` ↔
/// `http://www.w3.org/1999/02/22-rdf-syntax-ns#`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Namespace {
    pub full: String,
    pub prefix: String,
}

/// An ordered set of namespace registrations.
#[derive(Clone, Debug, Default)]
pub struct Namespaces {
    prefixes: HashMap<String, String>,
}

impl Namespaces {
    pub fn new() -> Self {
        Namespaces::default()
    }

    /// Registers a prefix. A later registration of the same prefix wins.
    pub fn register(&mut self, ns: Namespace) {
        self.prefixes.insert(ns.prefix, ns.full);
    }

    /// Compacts a full IRI to its short form, if a registered namespace
    /// matches. Returns the input unchanged otherwise.
    pub fn short_iri(&self, iri: &str) -> String {
        for (prefix, full) in &self.prefixes {
            if let Some(rest) = iri.strip_prefix(full.as_str()) {
                return format!("{prefix}{rest}");
            }
        }
        iri.to_owned()
    }

    /// Expands a short IRI to its full form, if its prefix is registered.
    /// Returns the input unchanged otherwise.
    pub fn full_iri(&self, iri: &str) -> String {
        if let Some(colon) = iri.find(':') {
            let prefix = &iri[..=colon];
            if let Some(full) = self.prefixes.get(prefix) {
                return format!("{full}{}", &iri[colon + 1..]);
            }
        }
        iri.to_owned()
    }

    pub fn list(&self) -> Vec<Namespace> {
        let mut out: Vec<_> = self
            .prefixes
            .iter()
            .map(|(prefix, full)| Namespace {
                prefix: prefix.clone(),
                full: full.clone(),
            })
            .collect();
        out.sort_by(|a, b| a.prefix.cmp(&b.prefix));
        out
    }

    /// Copies every registration into `dst`.
    pub fn clone_to(&self, dst: &mut Namespaces) {
        for ns in self.list() {
            dst.register(ns);
        }
    }
}

static GLOBAL: LazyLock<RwLock<Namespaces>> = LazyLock::new(|| {
    let mut ns = Namespaces::new();
    for (prefix, full) in [
        (rdf::PREFIX, rdf::NS),
        (rdfs::PREFIX, rdfs::NS),
        (schema::PREFIX, schema::NS),
        (xsd::PREFIX, xsd::NS),
        (quiver::PREFIX, quiver::NS),
    ] {
        ns.register(Namespace {
            prefix: prefix.to_owned(),
            full: full.to_owned(),
        });
    }
    RwLock::new(ns)
});

/// Registers a prefix in the process-global registry.
pub fn register(ns: Namespace) {
    GLOBAL.write().unwrap().register(ns);
}

/// Compacts an IRI against the process-global registry.
pub fn short_iri(iri: &str) -> String {
    GLOBAL.read().unwrap().short_iri(iri)
}

/// Expands an IRI against the process-global registry.
pub fn full_iri(iri: &str) -> String {
    GLOBAL.read().unwrap().full_iri(iri)
}

/// Lists the process-global registrations.
pub fn list() -> Vec<Namespace> {
    GLOBAL.read().unwrap().list()
}

/// Copies the process-global registrations into `dst`.
pub fn clone_to(dst: &mut Namespaces) {
    GLOBAL.read().unwrap().clone_to(dst)
}

pub mod rdf {
    pub const NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const PREFIX: &str = "rdf:";

    /// The subject is an instance of a class.
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const VALUE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#value";
    pub const LIST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#List";
    pub const FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
    pub const REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
    pub const NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
}

pub mod rdfs {
    pub const NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
    pub const PREFIX: &str = "rdfs:";

    pub const CLASS: &str = "http://www.w3.org/2000/01/rdf-schema#Class";
    pub const LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
    pub const COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";
    pub const SUB_CLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
    pub const SUB_PROPERTY_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subPropertyOf";
}

pub mod schema {
    pub const NS: &str = "http://schema.org/";
    pub const PREFIX: &str = "schema:";

    pub const NAME: &str = "http://schema.org/name";
    pub const URL: &str = "http://schema.org/url";
}

pub mod xsd {
    pub const NS: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const PREFIX: &str = "xsd:";

    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
}

pub mod quiver {
    pub const NS: &str = "http://quiver.io/";
    pub const PREFIX: &str = "quiver:";

    /// Type IRI under which namespace registrations are persisted.
    pub const NAMESPACE: &str = "http://quiver.io/namespace";
    pub const NAMESPACE_PREFIX: &str = "http://quiver.io/prefix";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_prefixes_are_preregistered() {
        assert_eq!(short_iri(rdf::TYPE), "rdf:type");
        assert_eq!(full_iri("rdf:type"), rdf::TYPE);
        assert_eq!(full_iri("xsd:string"), xsd::STRING);
    }

    #[test]
    fn unknown_namespaces_pass_through() {
        assert_eq!(short_iri("http://unknown.test/x"), "http://unknown.test/x");
        assert_eq!(full_iri("unknown:x"), "unknown:x");
    }

    #[test]
    fn local_registry_is_independent() {
        let mut ns = Namespaces::new();
        assert_eq!(ns.short_iri(rdf::TYPE), rdf::TYPE);
        ns.register(Namespace {
            prefix: "r:".into(),
            full: rdf::NS.into(),
        });
        assert_eq!(ns.short_iri(rdf::TYPE), "r:type");
        assert_eq!(ns.list().len(), 1);
    }
}
