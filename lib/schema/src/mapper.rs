use crate::error::SchemaError;
use crate::fields::{FieldMap, FieldSlot};
use crate::registry;
use crate::rules::{Entity, FieldRule, TypeSchema};
use quiver_graph::iterate::{self, Fixed, Iterator, TagMap};
use quiver_graph::{QuadWriter, QueryContext, Ref, StoreRef};
use quiver_model::{voc, BlankNode, Iri, Quad, Value};
use quiver_path::{start_morphism, Path};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// How the mapper processes IRIs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IriMode {
    /// No transformation.
    #[default]
    Native,
    /// Compact IRIs with known namespaces.
    Short,
    /// Expand IRIs with known namespaces.
    Full,
}

type IdGenerator = Box<dyn Fn() -> Value + Send + Sync>;

/// Translates records to quads and tagged query results to records.
///
/// The per-type traversal paths are derived once per `(type, root-only)`
/// pair and cached; lookups are concurrent, insertion serializes.
pub struct Mapper {
    iris: IriMode,
    label: Option<Value>,
    generate_id: IdGenerator,
    paths: RwLock<HashMap<(usize, bool), Path>>,
}

impl Default for Mapper {
    fn default() -> Self {
        Mapper::new()
    }
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("iris", &self.iris)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl Mapper {
    pub fn new() -> Self {
        Mapper {
            iris: IriMode::Native,
            label: None,
            generate_id: Box::new(|| Value::BlankNode(BlankNode::random())),
            paths: RwLock::new(HashMap::new()),
        }
    }

    /// Sets the IRI conversion mode for predicates, ids and type IRIs.
    pub fn with_iri_mode(mut self, mode: IriMode) -> Self {
        self.iris = mode;
        self
    }

    /// Adds a graph label to every quad written. Does not affect queries.
    pub fn with_label(mut self, label: impl Into<Value>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Replaces the generator used for records without an id field.
    pub fn with_id_generator(
        mut self,
        generate: impl Fn() -> Value + Send + Sync + 'static,
    ) -> Self {
        self.generate_id = Box::new(generate);
        self
    }

    fn iri(&self, iri: Iri) -> Iri {
        match self.iris {
            IriMode::Native => iri,
            IriMode::Short => iri.short(),
            IriMode::Full => iri.full(),
        }
    }

    fn value(&self, v: Value) -> Value {
        match v {
            Value::Iri(iri) => Value::Iri(self.iri(iri)),
            other => other,
        }
    }

    fn type_pred(&self) -> Value {
        Value::Iri(self.iri(Iri::new(voc::rdf::TYPE)))
    }

    // ---- writing ---------------------------------------------------------

    /// Decomposes a record into quads, returning the record's identity in
    /// the written subgraph: the id field's value, or a generated blank
    /// node.
    pub fn write_as_quads<T: Entity>(
        &self,
        w: &mut dyn QuadWriter,
        obj: &T,
    ) -> Result<Value, SchemaError> {
        self.write_record(w, T::schema(), obj.to_fields())
    }

    fn write_record(
        &self,
        w: &mut dyn QuadWriter,
        schema: &'static TypeSchema,
        mut fields: FieldMap,
    ) -> Result<Value, SchemaError> {
        let id = self.record_id(schema, &mut fields)?;
        if let Some(type_iri) = registry::iri_for(schema) {
            w.write_quad(&Quad {
                subject: id.clone(),
                predicate: self.type_pred(),
                object: Value::Iri(self.iri(type_iri)),
                label: self.label.clone(),
            })?;
        }
        for field in schema.fields() {
            match field.rule() {
                FieldRule::Id => {}
                FieldRule::Constraint { pred, value, rev } => {
                    let pred = Value::Iri(self.iri(pred.clone()));
                    let value = self.value(value.clone());
                    let (s, o) = if *rev {
                        (value, id.clone())
                    } else {
                        (id.clone(), value)
                    };
                    w.write_quad(&Quad {
                        subject: s,
                        predicate: pred,
                        object: o,
                        label: self.label.clone(),
                    })?;
                }
                FieldRule::Save { pred, rev, opt } => {
                    let pred = Value::Iri(self.iri(pred.clone()));
                    match fields.take_slot(field.path()) {
                        Some(FieldSlot::Values(vs)) if !vs.is_empty() => {
                            for v in vs {
                                self.write_edge(w, &id, &pred, self.value(v), *rev)?;
                            }
                        }
                        Some(FieldSlot::Records(rs)) if !rs.is_empty() => {
                            let nested = field.nested().ok_or_else(|| {
                                SchemaError::InvalidSchema(format!(
                                    "field {} carries records but declares no nested schema",
                                    field.path()
                                ))
                            })?;
                            for r in rs {
                                let child_id = self.write_record(w, nested(), r)?;
                                self.write_edge(w, &id, &pred, child_id, *rev)?;
                            }
                        }
                        _ => {
                            if !opt {
                                return Err(SchemaError::RequiredFieldNotSet {
                                    field: field.path().to_owned(),
                                });
                            }
                        }
                    }
                }
            }
        }
        Ok(id)
    }

    fn write_edge(
        &self,
        w: &mut dyn QuadWriter,
        id: &Value,
        pred: &Value,
        object: Value,
        rev: bool,
    ) -> Result<(), SchemaError> {
        let (s, o) = if rev {
            (object, id.clone())
        } else {
            (id.clone(), object)
        };
        w.write_quad(&Quad {
            subject: s,
            predicate: pred.clone(),
            object: o,
            label: self.label.clone(),
        })?;
        Ok(())
    }

    fn record_id(
        &self,
        schema: &'static TypeSchema,
        fields: &mut FieldMap,
    ) -> Result<Value, SchemaError> {
        if let Some(field) = schema.id_field() {
            if let Some(FieldSlot::Values(vs)) = fields.take_slot(field.path()) {
                if let Some(v) = vs.into_iter().next() {
                    return match v {
                        Value::Iri(iri) => Ok(Value::Iri(self.iri(iri))),
                        Value::BlankNode(_) => Ok(v),
                        Value::Str(s) => Ok(Value::Iri(self.iri(Iri::new(s)))),
                        other => Err(SchemaError::TypeConversion {
                            from: crate::fields::kind_name(&other),
                            to: "identifier",
                        }),
                    };
                }
            }
        }
        Ok((self.generate_id)())
    }

    // ---- loading ---------------------------------------------------------

    /// Loads a single record starting from the given ids (from any matching
    /// node, if empty).
    pub fn load_to<T: Entity>(
        &self,
        ctx: &QueryContext,
        qs: &StoreRef,
        ids: &[Value],
    ) -> Result<T, SchemaError> {
        self.load_to_depth(ctx, qs, -1, ids)
    }

    /// Like [`Mapper::load_to`], stopping recursion into record fields at
    /// `depth`. Zero means "root fields only"; negative means unlimited.
    pub fn load_to_depth<T: Entity>(
        &self,
        ctx: &QueryContext,
        qs: &StoreRef,
        depth: i32,
        ids: &[Value],
    ) -> Result<T, SchemaError> {
        let list = ids_iterator(qs, ids);
        let mut visited = HashSet::new();
        let mut out = self.load_records(
            ctx,
            qs,
            T::schema(),
            normalize_depth(depth),
            list,
            false,
            &mut visited,
        )?;
        match out.pop() {
            Some(fields) => T::from_fields(fields),
            None => {
                // distinguish a missing node from one ruled out by type
                // constraints or required fields
                if !ids.is_empty() && ids.iter().any(|v| qs.value_of(v).is_some()) {
                    Err(SchemaError::RequiredFieldMissing)
                } else {
                    Err(SchemaError::NotFound)
                }
            }
        }
    }

    /// Loads every record matching the given ids (all of them, if empty).
    /// Records missing required fields are skipped, not errors.
    pub fn load_all<T: Entity>(
        &self,
        ctx: &QueryContext,
        qs: &StoreRef,
        ids: &[Value],
    ) -> Result<Vec<T>, SchemaError> {
        self.load_all_depth(ctx, qs, -1, ids)
    }

    pub fn load_all_depth<T: Entity>(
        &self,
        ctx: &QueryContext,
        qs: &StoreRef,
        depth: i32,
        ids: &[Value],
    ) -> Result<Vec<T>, SchemaError> {
        let list = ids_iterator(qs, ids);
        self.load_iterator_to_depth(ctx, qs, depth, list)
    }

    /// The lower-level form: loads every record reachable from an explicit
    /// node iterator (all nodes if `None`).
    pub fn load_iterator_to_depth<T: Entity>(
        &self,
        ctx: &QueryContext,
        qs: &StoreRef,
        depth: i32,
        list: Option<Box<dyn Iterator>>,
    ) -> Result<Vec<T>, SchemaError> {
        let mut visited = HashSet::new();
        let maps = self.load_records(
            ctx,
            qs,
            T::schema(),
            normalize_depth(depth),
            list,
            true,
            &mut visited,
        )?;
        maps.into_iter().map(T::from_fields).collect()
    }

    /// Loads records by a custom path instead of the type's own derived
    /// path root.
    pub fn load_path_to<T: Entity>(
        &self,
        ctx: &QueryContext,
        qs: &StoreRef,
        p: &Path,
    ) -> Result<Vec<T>, SchemaError> {
        let it = p.build_iterator(qs)?;
        self.load_iterator_to_depth(ctx, qs, -1, Some(it))
    }

    fn load_records(
        &self,
        ctx: &QueryContext,
        qs: &StoreRef,
        schema: &'static TypeSchema,
        depth: i32,
        list: Option<Box<dyn Iterator>>,
        many: bool,
        visited: &mut HashSet<Ref>,
    ) -> Result<Vec<FieldMap>, SchemaError> {
        if let Some(e) = ctx.done() {
            return Err(e.into());
        }
        let root_only = depth == 0;
        let path = self.path_for(schema, root_only);
        let mut it = path.build_iterator(qs)?;
        if let Some(list) = list {
            it = Box::new(iterate::And::new(vec![list, it]));
        }
        let mut it = iterate::optimize(qs, it);

        let mut out = Vec::new();
        while it.next(ctx) {
            if let Some(e) = ctx.done() {
                it.close().ok();
                return Err(e.into());
            }
            let mut tags = TagMap::new();
            it.tag_results(&mut tags);
            if tags.is_empty() {
                continue;
            }
            let mut bound: HashMap<String, Vec<Ref>> = HashMap::new();
            for (tag, r) in tags {
                bound.insert(tag, vec![r]);
            }
            while it.next_path(ctx) {
                if let Some(e) = ctx.done() {
                    it.close().ok();
                    return Err(e.into());
                }
                let mut more = TagMap::new();
                it.tag_results(&mut more);
                for (tag, r) in more {
                    let entry = bound.entry(tag).or_default();
                    if !entry.contains(&r) {
                        entry.push(r);
                    }
                }
            }
            match self.load_fields(ctx, qs, schema, depth, bound, visited) {
                Ok(fields) => {
                    out.push(fields);
                    if !many {
                        break;
                    }
                }
                Err(SchemaError::RequiredFieldMissing) if many => continue,
                Err(e) => {
                    it.close().ok();
                    return Err(e);
                }
            }
        }
        if let Some(e) = it.err() {
            let msg = e.to_string();
            it.close().ok();
            return Err(SchemaError::Iteration(msg));
        }
        it.close().ok();
        Ok(out)
    }

    fn load_fields(
        &self,
        ctx: &QueryContext,
        qs: &StoreRef,
        schema: &'static TypeSchema,
        depth: i32,
        bound: HashMap<String, Vec<Ref>>,
        visited: &mut HashSet<Ref>,
    ) -> Result<FieldMap, SchemaError> {
        let root_only = depth == 0;
        if !root_only {
            for field in schema.fields() {
                if let FieldRule::Save { opt: false, .. } = field.rule() {
                    if bound.get(field.path()).map_or(true, |refs| refs.is_empty()) {
                        return Err(SchemaError::RequiredFieldMissing);
                    }
                }
            }
        }
        let mut fields = FieldMap::new();
        for field in schema.fields() {
            if matches!(field.rule(), FieldRule::Constraint { .. }) {
                continue;
            }
            let Some(refs) = bound.get(field.path()) else {
                continue;
            };
            if matches!(field.rule(), FieldRule::Id) {
                if let Some(v) = refs.first().and_then(|r| qs.name_of(r)) {
                    fields.insert_value(field.path(), v);
                }
                continue;
            }
            match field.nested() {
                Some(nested) if !root_only => {
                    let child_schema = nested();
                    let mut records = Vec::new();
                    for r in refs {
                        if depth - 1 < 0 && !visited.insert(r.clone()) {
                            continue;
                        }
                        let seed: Box<dyn Iterator> = Box::new(Fixed::new(vec![r.clone()]));
                        match self.load_records(
                            ctx,
                            qs,
                            child_schema,
                            depth - 1,
                            Some(seed),
                            false,
                            visited,
                        ) {
                            Ok(mut maps) => {
                                if let Some(map) = maps.pop() {
                                    records.push(map);
                                }
                            }
                            Err(SchemaError::RequiredFieldMissing) => continue,
                            Err(e) => return Err(e),
                        }
                    }
                    fields.insert_records(field.path(), records);
                }
                Some(_) => {}
                None => {
                    let vs: Vec<Value> =
                        refs.iter().filter_map(|r| qs.name_of(r)).collect();
                    fields.insert_values(field.path(), vs);
                }
            }
        }
        Ok(fields)
    }

    // ---- paths -----------------------------------------------------------

    fn path_for(&self, schema: &'static TypeSchema, root_only: bool) -> Path {
        let key = (schema as *const TypeSchema as usize, root_only);
        if let Some(p) = self.paths.read().unwrap().get(&key) {
            return p.clone();
        }
        let p = self.make_path(schema, root_only);
        tracing::debug!(schema = schema.name(), root_only, "derived type path");
        self.paths.write().unwrap().insert(key, p.clone());
        p
    }

    fn make_path(&self, schema: &'static TypeSchema, root_only: bool) -> Path {
        let mut p = start_morphism();
        if let Some(type_iri) = registry::iri_for(schema) {
            p = p.has(self.type_pred(), [Value::Iri(self.iri(type_iri))]);
        }
        for field in schema.fields() {
            match field.rule() {
                FieldRule::Id => {
                    p = p.tag(field.path());
                }
                FieldRule::Constraint { pred, value, rev } => {
                    let pred = Value::Iri(self.iri(pred.clone()));
                    let nodes = vec![self.value(value.clone())];
                    p = if *rev {
                        p.has_reverse(pred, nodes)
                    } else {
                        p.has(pred, nodes)
                    };
                }
                FieldRule::Save { pred, rev, opt } => {
                    let pred = Value::Iri(self.iri(pred.clone()));
                    let tag = field.path().to_owned();
                    p = match (*opt, root_only, *rev) {
                        (true, true, _) => p,
                        (true, false, true) => p.save_optional_reverse(pred, tag),
                        (true, false, false) => p.save_optional(pred, tag),
                        (false, true, true) => p.has_reverse(pred, []),
                        (false, true, false) => p.has(pred, []),
                        (false, false, true) => p.save_reverse(pred, tag),
                        (false, false, false) => p.save(pred, tag),
                    };
                }
            }
        }
        p
    }
}

/// Builds a path for a record type without loading anything; useful for
/// composing with hand-written paths.
pub fn path_for_type<T: Entity>(mapper: &Mapper) -> Path {
    mapper.path_for(T::schema(), false)
}

fn normalize_depth(depth: i32) -> i32 {
    // 0 means "root fields only" for callers, which is one level here
    if depth >= 0 {
        depth + 1
    } else {
        depth
    }
}

fn ids_iterator(qs: &StoreRef, ids: &[Value]) -> Option<Box<dyn Iterator>> {
    if ids.is_empty() {
        return None;
    }
    Some(Box::new(Fixed::new(
        ids.iter().filter_map(|v| qs.value_of(v)).collect(),
    )))
}
