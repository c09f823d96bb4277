#[path = "common/mod.rs"]
mod common;

use common::*;
use hnetl::{resolve_comments, ItemStore, RunStats};
use serde_json::json;

#[test]
fn preserves_child_order_and_skips_misses_and_zombies() {
    let store = make_store();
    let stats = RunStats::default();
    let root = store.get(1).unwrap();

    let comments = resolve_comments(root, &store, 256, &stats).unwrap();
    let ids: Vec<u64> = comments.iter().map(|c| c.id).collect();
    // 3 is a zombie (no time) and 99 does not exist; 2 and 4 survive in order.
    assert_eq!(ids, [2, 4]);
    assert_eq!(comments[0].comments.len(), 1);
    assert_eq!(comments[0].comments[0].id, 5);
    assert!(comments[0].comments[0].comments.is_empty());
    assert_eq!(comments[0].by.as_deref(), Some("bo"));
    assert_eq!(comments[1].text.as_deref(), Some("third"));

    let summary = stats.summary();
    assert_eq!(summary.zombies, 1);
    assert_eq!(summary.missing_children, 1);
    assert_eq!(summary.missing_sample, vec![(99, 1)]);
}

#[test]
fn item_without_kids_resolves_empty() {
    let store = make_store();
    let stats = RunStats::default();
    let comments = resolve_comments(store.get(10).unwrap(), &store, 256, &stats).unwrap();
    assert!(comments.is_empty());
    assert_eq!(stats.summary(), RunStats::default().summary());
}

#[test]
fn resolving_twice_yields_identical_trees() {
    let store = make_store();
    let root = store.get(1).unwrap();
    let first = resolve_comments(root, &store, 256, &RunStats::default()).unwrap();
    let second = resolve_comments(root, &store, 256, &RunStats::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn depth_cap_is_fatal_on_cyclic_input() {
    // Comments referencing each other never happen in well-formed dumps;
    // the cap must turn the loop into an error instead of a stack overflow.
    let store = ItemStore::from_items([
        item(json!({"id":1,"type":"story","time":1,"kids":[2]})),
        item(json!({"id":2,"type":"comment","time":2,"kids":[3]})),
        item(json!({"id":3,"type":"comment","time":3,"kids":[2]})),
    ]);
    let stats = RunStats::default();
    let err = resolve_comments(store.get(1).unwrap(), &store, 16, &stats).unwrap_err();
    assert!(err.to_string().contains("depth cap"));
}

#[test]
fn deep_but_finite_chains_resolve_within_the_cap() {
    let mut items = vec![item(json!({"id":1,"type":"story","time":1,"kids":[2]}))];
    for i in 2..=40u64 {
        let kids: Vec<u64> = if i < 40 { vec![i + 1] } else { Vec::new() };
        items.push(item(json!({"id":i,"type":"comment","time":i,"kids":kids})));
    }
    let store = ItemStore::from_items(items);
    let stats = RunStats::default();
    let comments = resolve_comments(store.get(1).unwrap(), &store, 256, &stats).unwrap();

    let mut depth = 0;
    let mut level = &comments;
    while let Some(first) = level.first() {
        depth += 1;
        level = &first.comments;
    }
    assert_eq!(depth, 39);
}
