//! Persistence of namespace registrations through the mapper itself.

use crate::error::SchemaError;
use crate::fields::FieldMap;
use crate::mapper::Mapper;
use crate::rules::{Entity, TypeSchema};
use quiver_graph::{QuadWriter, QueryContext, StoreRef};
use quiver_model::voc::{self, Namespace, Namespaces};
use quiver_model::{Iri, Value};
use std::sync::LazyLock;

/// A namespace registration as a record: the full IRI is the identity, the
/// prefix hangs off it, and a type constraint keeps the records findable.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NamespaceRecord {
    full: Iri,
    prefix: Iri,
}

impl Entity for NamespaceRecord {
    fn schema() -> &'static TypeSchema {
        static SCHEMA: LazyLock<TypeSchema> = LazyLock::new(|| {
            TypeSchema::builder("namespace")
                .constraint(
                    Iri::new(voc::rdf::TYPE),
                    Value::Iri(Iri::new(voc::quiver::NAMESPACE)),
                )
                .id("full")
                .save("prefix", Iri::new(voc::quiver::NAMESPACE_PREFIX))
                .build()
        });
        &SCHEMA
    }

    fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert_value("full", self.full.clone());
        fields.insert_value("prefix", self.prefix.clone());
        fields
    }

    fn from_fields(mut fields: FieldMap) -> Result<Self, SchemaError> {
        Ok(NamespaceRecord {
            full: fields.required("full")?,
            prefix: fields.required("prefix")?,
        })
    }
}

impl Mapper {
    /// Writes every registration of `ns` into the graph.
    pub fn write_namespaces(
        &self,
        w: &mut dyn QuadWriter,
        ns: &Namespaces,
    ) -> Result<(), SchemaError> {
        for n in ns.list() {
            self.write_as_quads(
                w,
                &NamespaceRecord {
                    full: Iri::new(n.full),
                    prefix: Iri::new(n.prefix),
                },
            )?;
        }
        Ok(())
    }

    /// Loads namespace registrations stored in the graph into `dest`.
    pub fn load_namespaces(
        &self,
        ctx: &QueryContext,
        qs: &StoreRef,
        dest: &mut Namespaces,
    ) -> Result<(), SchemaError> {
        let records: Vec<NamespaceRecord> = self.load_all(ctx, qs, &[])?;
        for r in records {
            dest.register(Namespace {
                prefix: r.prefix.into_string(),
                full: r.full.into_string(),
            });
        }
        Ok(())
    }
}
