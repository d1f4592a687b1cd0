use quiver_graph::iterate::{drain, Fixed, Iterator, Kind, LinksTo};
use quiver_graph::{QuadStore, QuadWriter, QueryContext, Ref, StoreError, StoreRef};
use quiver_memstore::{MemStore, MemWriter};
use quiver_model::{iri, Direction, Quad, Value};
use std::sync::Arc;

fn simple_graph() -> Arc<MemStore> {
    let store = MemStore::new();
    store.add_quad(&Quad::triple(iri("alice"), iri("follows"), iri("bob")));
    store.add_quad(&Quad::triple(iri("bob"), iri("follows"), iri("carol")));
    store.add_quad(&Quad::triple(iri("alice"), iri("name"), "Alice"));
    Arc::new(store)
}

#[test]
fn value_name_round_trip() {
    let store = simple_graph();
    for v in [iri("alice"), iri("follows"), Value::from("Alice")] {
        let r = store.value_of(&v).expect("indexed value");
        assert_eq!(store.name_of(&r), Some(v));
    }
    assert_eq!(store.value_of(&iri("nobody")), None);
}

#[test]
fn name_of_resolves_pre_fetched() {
    let store = simple_graph();
    let v = Value::from("anything");
    assert_eq!(store.name_of(&Ref::pre_fetched(v.clone())), Some(v));
}

#[test]
fn stats_track_live_entries() {
    let store = MemStore::new();
    let q = Quad::triple(iri("a"), iri("p"), iri("b"));
    assert!(store.add_quad(&q));
    assert!(!store.add_quad(&q));
    assert_eq!(store.stats().quads, 1);
    assert_eq!(store.stats().nodes, 3);

    assert!(store.remove_quad(&q));
    assert!(!store.remove_quad(&q));
    assert_eq!(store.stats().quads, 0);
    assert_eq!(store.stats().nodes, 0);
}

#[test]
fn quad_iterator_walks_a_direction() {
    let ctx = QueryContext::background();
    let store = simple_graph();
    let alice = store.value_of(&iri("alice")).unwrap();
    let mut it = store.quad_iterator(Direction::Subject, &alice);
    let quads: Vec<_> = drain(&ctx, it.as_mut())
        .into_iter()
        .map(|r| store.quad(&r).unwrap())
        .collect();
    assert_eq!(quads.len(), 2);
    assert!(quads.iter().all(|q| q.subject == iri("alice")));
    it.close().unwrap();
}

#[test]
fn quad_direction_projects_endpoints() {
    let store = simple_graph();
    let alice = store.value_of(&iri("alice")).unwrap();
    let mut it = store.quad_iterator(Direction::Subject, &alice);
    let ctx = QueryContext::background();
    assert!(it.next(&ctx));
    let q = it.result().unwrap();
    assert_eq!(
        store.quad_direction(&q, Direction::Subject),
        Some(alice.clone())
    );
    assert_eq!(store.quad_direction(&q, Direction::Label), None);
}

#[test]
fn all_iterators_cover_the_store() {
    let ctx = QueryContext::background();
    let store = simple_graph();
    let mut nodes = store.nodes_all_iterator();
    // alice, bob, carol, follows, name, "Alice"
    assert_eq!(drain(&ctx, nodes.as_mut()).len(), 6);
    let mut quads = store.quads_all_iterator();
    assert_eq!(drain(&ctx, quads.as_mut()).len(), 3);
}

#[test]
fn writer_surfaces_sentinels() {
    let store = Arc::new(MemStore::new());
    let mut w = MemWriter::new(store.clone());
    let q = Quad::triple(iri("a"), iri("p"), iri("b"));
    w.write_quad(&q).unwrap();
    assert!(matches!(w.write_quad(&q), Err(StoreError::QuadExists)));
    w.remove_quad(&q).unwrap();
    assert!(matches!(w.remove_quad(&q), Err(StoreError::QuadNotExist)));

    let mut relaxed = MemWriter::new(store).ignore_duplicates(true).ignore_missing(true);
    relaxed.write_quad(&q).unwrap();
    relaxed.write_quad(&q).unwrap();
    relaxed.remove_quad(&q).unwrap();
    relaxed.remove_quad(&q).unwrap();
}

#[test]
fn links_to_over_one_node_is_replaced_by_the_index() {
    let ctx = QueryContext::background();
    let store: StoreRef = simple_graph();
    let alice = store.value_of(&iri("alice")).unwrap();
    let links: Box<dyn Iterator> = Box::new(LinksTo::new(
        store.clone(),
        Box::new(Fixed::new(vec![alice])),
        Direction::Subject,
    ));
    let (mut opt, replaced) = store.optimize_iterator(links);
    assert!(replaced);
    assert_eq!(opt.kind(), Kind::Custom("memstore"));
    assert_eq!(drain(&ctx, opt.as_mut()).len(), 2);
}
