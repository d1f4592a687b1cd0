use crate::error::SchemaError;
use crate::rules::{Entity, TypeSchema};
use quiver_model::Iri;
use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};

#[derive(Default)]
struct Registry {
    by_schema: HashMap<usize, Iri>,
    by_iri: HashMap<String, usize>,
}

static REGISTRY: LazyLock<RwLock<Registry>> = LazyLock::new(|| RwLock::new(Registry::default()));

fn schema_key(schema: &'static TypeSchema) -> usize {
    schema as *const TypeSchema as usize
}

/// Associates a type IRI with a record type. Registered types get a
/// `rdf:type` quad on write and a type constraint on load.
///
/// Registering a type or an IRI twice is an error.
pub fn register_type<T: Entity>(iri: impl Into<Iri>) -> Result<(), SchemaError> {
    register_schema(T::schema(), iri)
}

/// The dynamic form of [`register_type`].
pub fn register_schema(schema: &'static TypeSchema, iri: impl Into<Iri>) -> Result<(), SchemaError> {
    let iri = iri.into().full();
    let key = schema_key(schema);
    let mut reg = REGISTRY.write().unwrap();
    if reg.by_schema.contains_key(&key) {
        return Err(SchemaError::AlreadyRegistered { iri });
    }
    if let Some(&taken) = reg.by_iri.get(iri.as_str()) {
        if taken != key {
            return Err(SchemaError::AlreadyRegistered { iri });
        }
    }
    tracing::debug!(schema = schema.name(), iri = %iri, "registered record type");
    reg.by_iri.insert(iri.as_str().to_owned(), key);
    reg.by_schema.insert(key, iri);
    Ok(())
}

/// The type IRI a schema was registered under, if any.
pub(crate) fn iri_for(schema: &'static TypeSchema) -> Option<Iri> {
    REGISTRY
        .read()
        .unwrap()
        .by_schema
        .get(&schema_key(schema))
        .cloned()
}
