use crate::error::SchemaError;
use crate::fields::FieldMap;
use quiver_model::{Iri, Value};

/// How one field maps to quads. Rules are plain data; everything that
/// interprets them lives in the mapper.
#[derive(Clone, Debug)]
pub enum FieldRule {
    /// The field holds the record's identity (the quad subject).
    Id,
    /// The record's subgraph must contain the fixed edge `pred → value`;
    /// nothing is stored in the record itself.
    Constraint {
        pred: Iri,
        value: Value,
        rev: bool,
    },
    /// One quad per field value over `pred`, reversed if `rev`; an optional
    /// field may be absent on load and empty on write.
    Save { pred: Iri, rev: bool, opt: bool },
}

/// Whether a field holds one value or a sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    Sequence,
}

/// Resolves the schema of a nested record field. A function pointer keeps
/// schemas `'static` and allows self-referential types.
pub type SchemaRef = fn() -> &'static TypeSchema;

/// One field of a [`TypeSchema`]. The `path` doubles as the tag under which
/// query results carry the field's values; embedded schemas contribute
/// dotted paths.
#[derive(Clone, Debug)]
pub struct FieldSchema {
    path: String,
    rule: FieldRule,
    kind: FieldKind,
    nested: Option<SchemaRef>,
}

impl FieldSchema {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn rule(&self) -> &FieldRule {
        &self.rule
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn nested(&self) -> Option<SchemaRef> {
        self.nested
    }
}

/// The derived, data-only description of a record type: its field rules in
/// declaration order. Built once per type and cached behind the type's
/// [`Entity::schema`] accessor.
#[derive(Clone, Debug)]
pub struct TypeSchema {
    name: &'static str,
    fields: Vec<FieldSchema>,
}

impl TypeSchema {
    pub fn builder(name: &'static str) -> SchemaBuilder {
        SchemaBuilder {
            name,
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub(crate) fn id_field(&self) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|f| matches!(f.rule, FieldRule::Id))
    }
}

/// Modifiers of a saved field. Sequences default to optional and scalars to
/// required; `optional` overrides either way.
#[derive(Clone, Copy, Debug, Default)]
pub struct SaveOpts {
    pub reverse: bool,
    pub sequence: bool,
    pub optional: Option<bool>,
}

impl SaveOpts {
    pub fn sequence() -> Self {
        SaveOpts {
            sequence: true,
            ..SaveOpts::default()
        }
    }

    pub fn reverse() -> Self {
        SaveOpts {
            reverse: true,
            ..SaveOpts::default()
        }
    }

    pub fn optional() -> Self {
        SaveOpts {
            optional: Some(true),
            ..SaveOpts::default()
        }
    }
}

/// Builds a [`TypeSchema`] field by field, applying the default optionality
/// rules.
#[derive(Debug)]
pub struct SchemaBuilder {
    name: &'static str,
    fields: Vec<FieldSchema>,
}

impl SchemaBuilder {
    /// Declares the identity field.
    pub fn id(mut self, field: &str) -> Self {
        self.fields.push(FieldSchema {
            path: field.to_owned(),
            rule: FieldRule::Id,
            kind: FieldKind::Scalar,
            nested: None,
        });
        self
    }

    /// Declares a required scalar field saved over `pred`.
    pub fn save(self, field: &str, pred: impl Into<Iri>) -> Self {
        self.save_with(field, pred, SaveOpts::default())
    }

    pub fn save_with(mut self, field: &str, pred: impl Into<Iri>, opts: SaveOpts) -> Self {
        let opt = opts.optional.unwrap_or(opts.sequence);
        self.fields.push(FieldSchema {
            path: field.to_owned(),
            rule: FieldRule::Save {
                pred: pred.into(),
                rev: opts.reverse,
                opt,
            },
            kind: if opts.sequence {
                FieldKind::Sequence
            } else {
                FieldKind::Scalar
            },
            nested: None,
        });
        self
    }

    /// Declares a field holding nested records of another schema.
    pub fn save_nested(
        self,
        field: &str,
        pred: impl Into<Iri>,
        schema: SchemaRef,
    ) -> Self {
        self.save_nested_with(field, pred, SaveOpts::default(), schema)
    }

    pub fn save_nested_with(
        mut self,
        field: &str,
        pred: impl Into<Iri>,
        opts: SaveOpts,
        schema: SchemaRef,
    ) -> Self {
        let opt = opts.optional.unwrap_or(opts.sequence);
        self.fields.push(FieldSchema {
            path: field.to_owned(),
            rule: FieldRule::Save {
                pred: pred.into(),
                rev: opts.reverse,
                opt,
            },
            kind: if opts.sequence {
                FieldKind::Sequence
            } else {
                FieldKind::Scalar
            },
            nested: Some(schema),
        });
        self
    }

    /// Declares a fixed-edge constraint that is written with every record
    /// and required on load.
    pub fn constraint(self, pred: impl Into<Iri>, value: impl Into<Value>) -> Self {
        self.constraint_with(pred, value, false)
    }

    pub fn constraint_with(
        mut self,
        pred: impl Into<Iri>,
        value: impl Into<Value>,
        rev: bool,
    ) -> Self {
        let path = format!("constraint.{}", self.fields.len());
        self.fields.push(FieldSchema {
            path,
            rule: FieldRule::Constraint {
                pred: pred.into(),
                value: value.into(),
                rev,
            },
            kind: FieldKind::Scalar,
            nested: None,
        });
        self
    }

    /// Splices another schema's fields in under a dotted prefix, the way an
    /// embedded record flattens into its parent.
    pub fn embed(mut self, prefix: &str, schema: SchemaRef) -> Self {
        for f in schema().fields() {
            self.fields.push(FieldSchema {
                path: format!("{prefix}.{}", f.path),
                rule: f.rule.clone(),
                kind: f.kind,
                nested: f.nested,
            });
        }
        self
    }

    pub fn build(self) -> TypeSchema {
        TypeSchema {
            name: self.name,
            fields: self.fields,
        }
    }
}

/// Conversion between a record type and its dynamic field representation.
///
/// This is the seam generated code would target; implementations are plain
/// and mechanical: `schema` describes the fields once, `to_fields` dumps the
/// non-empty field values, `from_fields` extracts them back.
pub trait Entity: Sized {
    fn schema() -> &'static TypeSchema;

    fn to_fields(&self) -> FieldMap;

    fn from_fields(fields: FieldMap) -> Result<Self, SchemaError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_default_to_optional() {
        let schema = TypeSchema::builder("t")
            .save("scalar", Iri::new("p1"))
            .save_with("seq", Iri::new("p2"), SaveOpts::sequence())
            .save_with(
                "seq_req",
                Iri::new("p3"),
                SaveOpts {
                    sequence: true,
                    optional: Some(false),
                    ..SaveOpts::default()
                },
            )
            .build();
        let opts: Vec<bool> = schema
            .fields()
            .iter()
            .map(|f| match f.rule() {
                FieldRule::Save { opt, .. } => *opt,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(opts, vec![false, true, false]);
    }

    #[test]
    fn embed_prefixes_field_paths() {
        fn inner() -> &'static TypeSchema {
            static S: std::sync::LazyLock<TypeSchema> = std::sync::LazyLock::new(|| {
                TypeSchema::builder("inner").save("x", Iri::new("x")).build()
            });
            &S
        }
        let outer = TypeSchema::builder("outer").embed("inner", inner).build();
        assert_eq!(outer.fields()[0].path(), "inner.x");
    }
}
