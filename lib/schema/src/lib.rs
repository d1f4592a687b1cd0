//! Object-graph mapping: a bidirectional translator between typed records
//! and quad subgraphs.
//!
//! A type describes itself once through a [`TypeSchema`] (built with
//! [`SchemaBuilder`]) and converts to and from a dynamic [`FieldMap`] via the
//! [`Entity`] trait; the [`Mapper`] turns records into quads on write and
//! assembles tagged query results back into records on load.

mod error;
mod fields;
mod mapper;
mod namespaces;
mod registry;
mod rules;

pub use error::SchemaError;
pub use fields::{FieldMap, FieldSlot, FromValue};
pub use mapper::{path_for_type, IriMode, Mapper};
pub use registry::{register_schema, register_type};
pub use rules::{Entity, FieldKind, FieldRule, FieldSchema, SaveOpts, SchemaBuilder, SchemaRef, TypeSchema};
