use quiver_graph::iterate::{CompareOp, TagMap};
use quiver_graph::{QueryContext, Ref, StoreRef};
use quiver_memstore::store_with;
use quiver_model::{iri, Quad, Value};
use quiver_path::{start_morphism, start_path, Path, PathError};

fn follows_graph() -> StoreRef {
    store_with([
        Quad::triple(iri("alice"), iri("follows"), iri("bob")),
        Quad::triple(iri("bob"), iri("follows"), iri("carol")),
        Quad::triple(iri("carol"), iri("follows"), iri("dave")),
        Quad::triple(iri("alice"), iri("name"), "Alice"),
        Quad::triple(iri("bob"), iri("name"), "Bob"),
        Quad::triple(iri("alice"), iri("age"), Value::Int(25)),
        Quad::triple(iri("bob"), iri("age"), Value::Int(35)),
    ])
}

fn eval(qs: &StoreRef, p: &Path) -> Vec<Value> {
    let ctx = QueryContext::background();
    let mut it = p.build_iterator_optimized(qs).expect("valid path");
    let mut out = Vec::new();
    while it.next(&ctx) {
        let r = it.result().expect("result after advance");
        out.push(qs.name_of(&r).expect("resolvable result"));
    }
    it.close().expect("clean close");
    out
}

fn eval_sorted(qs: &StoreRef, p: &Path) -> Vec<Value> {
    let mut out = eval(qs, p);
    out.sort();
    out
}

#[test]
fn out_follows_a_predicate() {
    let qs = follows_graph();
    let p = start_path([iri("alice")]).out([iri("name")]);
    assert_eq!(eval(&qs, &p), vec![Value::from("Alice")]);
}

#[test]
fn out_composes_across_hops() {
    let qs = follows_graph();
    let p = start_path([iri("alice")]).out([iri("follows")]).out([iri("follows")]);
    assert_eq!(eval(&qs, &p), vec![iri("carol")]);
}

#[test]
fn in_walks_edges_backward() {
    let qs = follows_graph();
    let p = start_path([iri("carol")]).in_([iri("follows")]);
    assert_eq!(eval(&qs, &p), vec![iri("bob")]);
}

#[test]
fn out_without_predicates_follows_any_edge() {
    let qs = follows_graph();
    let p = start_path([iri("carol")]).out(Vec::new());
    assert_eq!(eval(&qs, &p), vec![iri("dave")]);
}

#[test]
fn has_keeps_nodes_with_a_matching_edge() {
    let qs = follows_graph();
    let p = start_path([]).has(iri("follows"), [iri("bob")]);
    assert_eq!(eval(&qs, &p), vec![iri("alice")]);

    let any = start_path([]).has(iri("name"), []);
    assert_eq!(
        eval_sorted(&qs, &any),
        vec![iri("alice"), iri("bob")]
    );
}

#[test]
fn has_reverse_looks_from_the_object_side() {
    let qs = follows_graph();
    let p = start_path([]).has_reverse(iri("follows"), [iri("alice")]);
    assert_eq!(eval(&qs, &p), vec![iri("bob")]);
}

#[test]
fn is_restricts_the_current_set() {
    let qs = follows_graph();
    let p = start_path([]).has(iri("name"), []).is([iri("bob")]);
    assert_eq!(eval(&qs, &p), vec![iri("bob")]);
}

#[test]
fn and_intersects_paths_from_the_same_root() {
    let qs = follows_graph();
    let p = start_path([])
        .has(iri("name"), [])
        .and(start_path([]).has(iri("follows"), [iri("carol")]));
    assert_eq!(eval(&qs, &p), vec![iri("bob")]);
}

#[test]
fn or_unions_paths() {
    let qs = follows_graph();
    let p = start_path([iri("alice")]).or(start_path([iri("dave")]));
    assert_eq!(eval_sorted(&qs, &p), vec![iri("alice"), iri("dave")]);
}

#[test]
fn except_subtracts_a_path() {
    let qs = follows_graph();
    let p = start_path([iri("alice"), iri("bob")]).except(start_path([iri("bob")]));
    assert_eq!(eval(&qs, &p), vec![iri("alice")]);
}

#[test]
fn tag_and_back_rewind_the_cursor() {
    let qs = follows_graph();
    let ctx = QueryContext::background();
    let p = start_path([iri("alice")])
        .out([iri("follows")])
        .tag("friend")
        .out([iri("follows")])
        .back("friend");
    let mut it = p.build_iterator_optimized(&qs).unwrap();
    assert!(it.next(&ctx));
    let result = qs.name_of(&it.result().unwrap()).unwrap();
    assert_eq!(result, iri("bob"));
    let mut tags = TagMap::new();
    it.tag_results(&mut tags);
    let friend = tags.get("friend").map(|r| qs.name_of(r).unwrap());
    assert_eq!(friend, Some(iri("bob")));
}

#[test]
fn back_to_an_unknown_tag_is_a_structural_error() {
    let qs = follows_graph();
    let p = start_path([iri("alice")]).out([iri("follows")]).back("nowhere");
    match p.build_iterator(&qs) {
        Err(PathError::BadPath { tag }) => assert_eq!(tag, "nowhere"),
        other => panic!("expected BadPath, got {other:?}"),
    }
}

#[test]
fn follow_inlines_a_morphism() {
    let qs = follows_graph();
    let step = start_morphism().out([iri("follows")]);
    let p = start_path([iri("alice")]).follow(step.clone()).follow(step);
    assert_eq!(eval(&qs, &p), vec![iri("carol")]);
}

#[test]
fn follow_reverse_walks_the_morphism_backward() {
    let qs = follows_graph();
    let step = start_morphism().out([iri("follows")]);
    let p = start_path([iri("carol")]).follow_reverse(step);
    assert_eq!(eval(&qs, &p), vec![iri("bob")]);
}

#[test]
fn follow_recursive_reaches_the_transitive_closure() {
    let qs = follows_graph();
    let step = start_morphism().out([iri("follows")]);
    let p = start_path([iri("alice")]).follow_recursive(step.clone(), -1);
    assert_eq!(
        eval_sorted(&qs, &p),
        vec![iri("bob"), iri("carol"), iri("dave")]
    );

    let one_hop = start_path([iri("alice")]).follow_recursive(step, 1);
    assert_eq!(eval(&qs, &one_hop), vec![iri("bob")]);
}

#[test]
fn follow_recursive_rejects_back_into_the_fragment() {
    let qs = follows_graph();
    let fragment = start_morphism().out([iri("follows")]).back("outer");
    let p = start_path([iri("alice")]).follow_recursive(fragment, -1);
    assert!(matches!(
        p.build_iterator(&qs),
        Err(PathError::UnresolvedTag { .. })
    ));
}

#[test]
fn save_records_values_without_moving() {
    let qs = follows_graph();
    let ctx = QueryContext::background();
    let p = start_path([iri("alice")]).save(iri("name"), "name");
    let mut it = p.build_iterator_optimized(&qs).unwrap();
    assert!(it.next(&ctx));
    assert_eq!(qs.name_of(&it.result().unwrap()).unwrap(), iri("alice"));
    let mut tags = TagMap::new();
    it.tag_results(&mut tags);
    let name = tags.get("name").map(|r| qs.name_of(r).unwrap());
    assert_eq!(name, Some(Value::from("Alice")));
}

#[test]
fn save_requires_the_edge_unless_optional() {
    let qs = follows_graph();
    // carol has no name quad
    let strict = start_path([iri("carol")]).save(iri("name"), "name");
    assert!(eval(&qs, &strict).is_empty());

    let ctx = QueryContext::background();
    let relaxed = start_path([iri("carol")]).save_optional(iri("name"), "name");
    let mut it = relaxed.build_iterator_optimized(&qs).unwrap();
    assert!(it.next(&ctx));
    let mut tags = TagMap::new();
    it.tag_results(&mut tags);
    assert!(!tags.contains_key("name"));
}

#[test]
fn labels_scope_traversal_to_a_graph() {
    let qs = store_with([
        Quad::new(iri("a"), iri("p"), iri("b"), Some(iri("g1"))),
        Quad::new(iri("a"), iri("p"), iri("c"), Some(iri("g2"))),
    ]);
    let scoped = start_path([iri("a")]).labels([iri("g1")]).out([iri("p")]);
    assert_eq!(eval(&qs, &scoped), vec![iri("b")]);

    let cleared = start_path([iri("a")])
        .labels([iri("g1")])
        .labels([])
        .out([iri("p")]);
    assert_eq!(eval_sorted(&qs, &cleared), vec![iri("b"), iri("c")]);
}

#[test]
fn count_limit_skip_unique_shape_results() {
    let qs = follows_graph();
    let everyone = start_path([]).has(iri("follows"), []);

    let counted = everyone.clone().count();
    let ctx = QueryContext::background();
    let mut it = counted.build_iterator_optimized(&qs).unwrap();
    assert!(it.next(&ctx));
    assert_eq!(it.result(), Some(Ref::PreFetched(Value::Int(3))));

    let limited = everyone.clone().limit(2);
    assert_eq!(eval(&qs, &limited).len(), 2);

    let skipped = everyone.clone().skip(2);
    assert_eq!(eval(&qs, &skipped).len(), 1);

    // both alice and bob follow someone with a name
    let fans = start_path([]).out([iri("follows")]).in_([iri("follows")]).unique();
    assert_eq!(eval(&qs, &fans).len(), 3);
}

#[test]
fn filter_compares_resolved_values() {
    let qs = follows_graph();
    let p = start_path([]).out([iri("age")]).filter(CompareOp::Gt, Value::Int(30));
    assert_eq!(eval(&qs, &p), vec![Value::Int(35)]);
}

#[test]
fn regex_matches_string_values() {
    let qs = follows_graph();
    let re = regex::Regex::new("^Ali").unwrap();
    let p = start_path([]).out([iri("name")]).regex(re);
    assert_eq!(eval(&qs, &p), vec![Value::from("Alice")]);
}

#[test]
fn unknown_start_nodes_yield_nothing() {
    let qs = follows_graph();
    let p = start_path([iri("nobody")]).out([iri("follows")]);
    assert!(eval(&qs, &p).is_empty());
}
