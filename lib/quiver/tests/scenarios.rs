//! End-to-end checks over the public surface: write quads, query with
//! paths, map records.

use quiver::graph::iterate::{drain, TagMap};
use quiver::graph::{QueryContext, Ref, StoreRef};
use quiver::model::{iri, Iri, Value};
use quiver::schema::{Entity, FieldMap, Mapper, SaveOpts, SchemaError, TypeSchema};
use quiver::{new_memory_graph, start_path, triple, Handle};
use std::sync::LazyLock;

fn eval(h: &Handle, p: &quiver::path::Path) -> Vec<Value> {
    let ctx = QueryContext::background();
    let qs = h.quad_store();
    let mut it = p.build_iterator_optimized(qs).expect("valid path");
    let mut out = Vec::new();
    while it.next(&ctx) {
        out.push(qs.name_of(&it.result().unwrap()).unwrap());
    }
    it.close().unwrap();
    out
}

#[test]
fn single_hop_yields_the_named_value() {
    let mut h = new_memory_graph();
    h.write([
        triple(iri("alice"), iri("name"), "Alice"),
        triple(iri("bob"), iri("name"), "Bob"),
    ])
    .unwrap();
    let p = start_path([iri("alice")]).out([iri("name")]);
    assert_eq!(eval(&h, &p), vec![Value::from("Alice")]);
    h.close().unwrap();
}

#[test]
fn two_hops_reach_the_friend_of_a_friend() {
    let mut h = new_memory_graph();
    h.write([
        triple(iri("alice"), iri("knows"), iri("bob")),
        triple(iri("bob"), iri("knows"), iri("carol")),
    ])
    .unwrap();
    let p = start_path([iri("alice")]).out([iri("knows")]).out([iri("knows")]);
    assert_eq!(eval(&h, &p), vec![iri("carol")]);
}

#[test]
fn count_over_a_path() {
    let mut h = new_memory_graph();
    h.write([
        triple(iri("alice"), iri("follows"), iri("bob")),
        triple(iri("alice"), iri("follows"), iri("carol")),
    ])
    .unwrap();
    let ctx = QueryContext::background();
    let p = start_path([iri("alice")]).out([iri("follows")]).count();
    let mut it = p.build_iterator_optimized(h.quad_store()).unwrap();
    assert!(it.next(&ctx));
    assert_eq!(it.result(), Some(Ref::PreFetched(Value::Int(2))));
    assert!(!it.next(&ctx));
}

#[test]
fn reset_then_redrain_is_idempotent() {
    let mut h = new_memory_graph();
    h.write([
        triple(iri("a"), iri("p"), iri("b")),
        triple(iri("a"), iri("p"), iri("c")),
        triple(iri("b"), iri("p"), iri("c")),
    ])
    .unwrap();
    let ctx = QueryContext::background();
    let p = start_path([]).out([iri("p")]);
    let mut it = p.build_iterator_optimized(h.quad_store()).unwrap();
    let mut first = drain(&ctx, it.as_mut());
    it.reset();
    let mut second = drain(&ctx, it.as_mut());
    first.sort_by_key(|r| format!("{r:?}"));
    second.sort_by_key(|r| format!("{r:?}"));
    assert_eq!(first, second);
}

#[test]
fn optimized_trees_bind_the_same_tags() {
    let mut h = new_memory_graph();
    h.write([
        triple(iri("alice"), iri("follows"), iri("bob")),
        triple(iri("bob"), iri("follows"), iri("carol")),
    ])
    .unwrap();
    let qs: &StoreRef = h.quad_store();
    let ctx = QueryContext::background();
    let p = start_path([]).tag("start").out([iri("follows")]).tag("end");

    let collect = |it: &mut Box<dyn quiver::graph::iterate::Iterator>| {
        let mut rows = Vec::new();
        while it.next(&ctx) {
            let mut tags = TagMap::new();
            it.tag_results(&mut tags);
            let mut row: Vec<(String, Value)> = tags
                .into_iter()
                .map(|(k, v)| (k, qs.name_of(&v).unwrap()))
                .collect();
            row.sort();
            rows.push(row);
        }
        rows.sort();
        rows
    };

    let mut plain = p.build_iterator(qs).unwrap();
    let mut optimized = p.build_iterator_optimized(qs).unwrap();
    assert_eq!(collect(&mut plain), collect(&mut optimized));
}

#[test]
fn cancellation_terminates_a_drive_loop() {
    let mut h = new_memory_graph();
    for i in 0..100 {
        h.write([triple(
            iri(format!("n{i}")),
            iri("p"),
            iri(format!("n{}", i + 1)),
        )])
        .unwrap();
    }
    let (ctx, handle) = QueryContext::with_cancel();
    let p = start_path([]).out([iri("p")]);
    let mut it = p.build_iterator_optimized(h.quad_store()).unwrap();
    assert!(it.next(&ctx));
    handle.cancel();
    let mut steps = 0;
    while it.next(&ctx) {
        steps += 1;
    }
    assert_eq!(steps, 0);
    assert!(it.err().is_some());
}

#[test]
fn removed_quads_stop_matching() {
    let mut h = new_memory_graph();
    let q = triple(iri("a"), iri("p"), iri("b"));
    h.write([q.clone()]).unwrap();
    assert_eq!(eval(&h, &start_path([iri("a")]).out([iri("p")])).len(), 1);
    h.remove_quad(&q).unwrap();
    assert_eq!(eval(&h, &start_path([iri("a")]).out([iri("p")])).len(), 0);
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Person {
    id: Iri,
    name: String,
    follows: Vec<Iri>,
}

impl Entity for Person {
    fn schema() -> &'static TypeSchema {
        static SCHEMA: LazyLock<TypeSchema> = LazyLock::new(|| {
            TypeSchema::builder("Person")
                .id("id")
                .save("name", Iri::new("name"))
                .save_with("follows", Iri::new("follows"), SaveOpts::sequence())
                .build()
        });
        &SCHEMA
    }

    fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert_value("id", self.id.clone());
        if !self.name.is_empty() {
            fields.insert_value("name", self.name.clone());
        }
        fields.insert_values(
            "follows",
            self.follows.iter().cloned().map(Value::Iri).collect(),
        );
        fields
    }

    fn from_fields(mut fields: FieldMap) -> Result<Self, SchemaError> {
        Ok(Person {
            id: fields.required("id")?,
            name: fields.required("name")?,
            follows: fields.values("follows")?,
        })
    }
}

#[test]
fn records_round_trip_through_the_graph() {
    let ctx = QueryContext::background();
    let mut h = new_memory_graph();
    let mapper = Mapper::new();
    let original = Person {
        id: Iri::new("alice"),
        name: "Alice".to_owned(),
        follows: vec![Iri::new("bob"), Iri::new("carol")],
    };
    mapper.write_as_quads(h.writer_mut(), &original).unwrap();

    let mut loaded: Person = mapper
        .load_to(&ctx, h.quad_store(), &[iri("alice")])
        .unwrap();
    loaded.follows.sort();
    assert_eq!(loaded, original);
}

#[test]
fn version_is_wired_from_the_manifest() {
    assert!(!quiver::VERSION.is_empty());
}
