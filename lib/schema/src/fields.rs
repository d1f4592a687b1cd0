use crate::error::SchemaError;
use crate::rules::Entity;
use chrono::{DateTime, Utc};
use quiver_model::{BlankNode, Iri, Value};
use std::collections::HashMap;

/// Dynamic representation of a record: field path to values or nested
/// records. [`Entity`] implementations convert through this on both load and
/// write.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldMap {
    slots: HashMap<String, FieldSlot>,
}

/// The content of one field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldSlot {
    Values(Vec<Value>),
    Records(Vec<FieldMap>),
}

impl FieldMap {
    pub fn new() -> Self {
        FieldMap::default()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Appends one value to the field. Used by `to_fields` implementations,
    /// which skip empty values so required-field checks see them as unset.
    pub fn insert_value(&mut self, path: impl Into<String>, v: impl Into<Value>) {
        match self
            .slots
            .entry(path.into())
            .or_insert_with(|| FieldSlot::Values(Vec::new()))
        {
            FieldSlot::Values(vs) => vs.push(v.into()),
            FieldSlot::Records(_) => {}
        }
    }

    /// Sets the field to the given values; an empty set leaves the field
    /// unset.
    pub fn insert_values(&mut self, path: impl Into<String>, vs: Vec<Value>) {
        if vs.is_empty() {
            return;
        }
        self.slots.insert(path.into(), FieldSlot::Values(vs));
    }

    pub fn insert_record(&mut self, path: impl Into<String>, r: FieldMap) {
        self.insert_records(path, vec![r]);
    }

    pub fn insert_records(&mut self, path: impl Into<String>, rs: Vec<FieldMap>) {
        if rs.is_empty() {
            return;
        }
        self.slots.insert(path.into(), FieldSlot::Records(rs));
    }

    pub fn take_slot(&mut self, path: &str) -> Option<FieldSlot> {
        self.slots.remove(path)
    }

    /// Extracts a required scalar.
    pub fn required<T: FromValue>(&mut self, path: &str) -> Result<T, SchemaError> {
        self.optional(path)?
            .ok_or(SchemaError::RequiredFieldMissing)
    }

    /// Extracts an optional scalar.
    pub fn optional<T: FromValue>(&mut self, path: &str) -> Result<Option<T>, SchemaError> {
        match self.take_slot(path) {
            None => Ok(None),
            Some(FieldSlot::Values(vs)) => {
                vs.into_iter().next().map(T::from_value).transpose()
            }
            Some(FieldSlot::Records(_)) => Err(SchemaError::TypeConversion {
                from: "record",
                to: T::KIND,
            }),
        }
    }

    /// Extracts a sequence; a missing field is an empty sequence.
    pub fn values<T: FromValue>(&mut self, path: &str) -> Result<Vec<T>, SchemaError> {
        match self.take_slot(path) {
            None => Ok(Vec::new()),
            Some(FieldSlot::Values(vs)) => vs.into_iter().map(T::from_value).collect(),
            Some(FieldSlot::Records(_)) => Err(SchemaError::TypeConversion {
                from: "record",
                to: T::KIND,
            }),
        }
    }

    /// Extracts an optional nested record.
    pub fn record<T: Entity>(&mut self, path: &str) -> Result<Option<T>, SchemaError> {
        Ok(self.records(path)?.into_iter().next())
    }

    /// Extracts a sequence of nested records; a missing field is empty.
    ///
    /// Members missing their own required fields are skipped rather than
    /// failing the parent: a depth-bounded load leaves partial records at
    /// the recursion boundary.
    pub fn records<T: Entity>(&mut self, path: &str) -> Result<Vec<T>, SchemaError> {
        match self.take_slot(path) {
            None => Ok(Vec::new()),
            Some(FieldSlot::Records(rs)) => rs
                .into_iter()
                .filter_map(|r| match T::from_fields(r) {
                    Ok(v) => Some(Ok(v)),
                    Err(SchemaError::RequiredFieldMissing) => None,
                    Err(e) => Some(Err(e)),
                })
                .collect(),
            Some(FieldSlot::Values(_)) => Err(SchemaError::TypeConversion {
                from: "value",
                to: "record",
            }),
        }
    }
}

pub(crate) fn kind_name(v: &Value) -> &'static str {
    match v {
        Value::Iri(_) => "iri",
        Value::BlankNode(_) => "blank node",
        Value::Str(_) => "string",
        Value::TypedStr { .. } => "typed string",
        Value::LangStr { .. } => "language string",
        Value::Int(_) => "int",
        Value::Float(_) => "float",
        Value::Bool(_) => "bool",
        Value::DateTime(_) => "datetime",
    }
}

/// Conversion from a graph [`Value`] into a field type.
pub trait FromValue: Sized {
    /// Name of the target kind, for conversion errors.
    const KIND: &'static str;

    fn from_value(v: Value) -> Result<Self, SchemaError>;
}

impl FromValue for Value {
    const KIND: &'static str = "value";

    fn from_value(v: Value) -> Result<Self, SchemaError> {
        Ok(v)
    }
}

impl FromValue for String {
    const KIND: &'static str = "string";

    fn from_value(v: Value) -> Result<Self, SchemaError> {
        match v {
            Value::Str(s) => Ok(s),
            Value::TypedStr { value, .. } | Value::LangStr { value, .. } => Ok(value),
            other => Err(SchemaError::TypeConversion {
                from: kind_name(&other),
                to: Self::KIND,
            }),
        }
    }
}

impl FromValue for i64 {
    const KIND: &'static str = "int";

    fn from_value(v: Value) -> Result<Self, SchemaError> {
        match v {
            Value::Int(i) => Ok(i),
            other => Err(SchemaError::TypeConversion {
                from: kind_name(&other),
                to: Self::KIND,
            }),
        }
    }
}

impl FromValue for f64 {
    const KIND: &'static str = "float";

    fn from_value(v: Value) -> Result<Self, SchemaError> {
        match v {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            other => Err(SchemaError::TypeConversion {
                from: kind_name(&other),
                to: Self::KIND,
            }),
        }
    }
}

impl FromValue for bool {
    const KIND: &'static str = "bool";

    fn from_value(v: Value) -> Result<Self, SchemaError> {
        match v {
            Value::Bool(b) => Ok(b),
            other => Err(SchemaError::TypeConversion {
                from: kind_name(&other),
                to: Self::KIND,
            }),
        }
    }
}

impl FromValue for DateTime<Utc> {
    const KIND: &'static str = "datetime";

    fn from_value(v: Value) -> Result<Self, SchemaError> {
        match v {
            Value::DateTime(t) => Ok(t),
            other => Err(SchemaError::TypeConversion {
                from: kind_name(&other),
                to: Self::KIND,
            }),
        }
    }
}

impl FromValue for Iri {
    const KIND: &'static str = "iri";

    fn from_value(v: Value) -> Result<Self, SchemaError> {
        match v {
            Value::Iri(iri) => Ok(iri),
            other => Err(SchemaError::TypeConversion {
                from: kind_name(&other),
                to: Self::KIND,
            }),
        }
    }
}

impl FromValue for BlankNode {
    const KIND: &'static str = "blank node";

    fn from_value(v: Value) -> Result<Self, SchemaError> {
        match v {
            Value::BlankNode(b) => Ok(b),
            other => Err(SchemaError::TypeConversion {
                from: kind_name(&other),
                to: Self::KIND,
            }),
        }
    }
}
