#[path = "common/mod.rs"]
mod common;

use common::*;
use anyhow::Result;
use hnetl::{CancelToken, HackerNewsETL, ItemStore, MemoryBuild, OrderedBuild, Record};
use serde_json::json;
use std::fs;
use std::sync::Arc;

fn etl() -> HackerNewsETL {
    HackerNewsETL::new().progress(false)
}

#[test]
fn end_to_end_minimal_thread() {
    let store = Arc::new(ItemStore::from_items([
        item(json!({"id":1,"type":"story","time":100,"kids":[2,3]})),
        item(json!({"id":2,"type":"comment","time":101,"by":"a","text":"hi"})),
        item(json!({"id":3,"type":"comment"})),
    ]));
    let (map, summary) = etl().workers(4).run(store, MemoryBuild::new()).unwrap();

    assert_eq!(map.len(), 1);
    let rec = &map[&1];
    assert_eq!(rec.get("id").and_then(|v| v.as_int()), Some(1));
    assert!(rec.get("title").unwrap().is_nothing());

    // Entry 3 has no time: a zombie, skipped without losing its sibling.
    let comments = rec.get("comments").unwrap().as_records().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].get("id").and_then(|v| v.as_int()), Some(2));
    assert_eq!(comments[0].get("by").and_then(|v| v.as_str()), Some("a"));
    assert_eq!(comments[0].get("text").and_then(|v| v.as_str()), Some("hi"));
    assert!(comments[0].get("comments").unwrap().as_records().unwrap().is_empty());

    assert_eq!(summary.stories, 1);
    assert_eq!(summary.zombies, 1);
}

#[test]
fn only_stories_reach_the_aggregate() {
    let store = Arc::new(make_store());
    let (map, summary) = etl().run(store, MemoryBuild::new()).unwrap();

    let keys: Vec<u64> = map.keys().copied().collect();
    assert_eq!(keys, [1, 10]);
    // The poll at key 6 has a populated kids list and still never shows up.
    assert!(!map.contains_key(&6));
    assert!(!map.contains_key(&8));
    assert!(!map.contains_key(&11));

    // Stories 1, 9, 10 were scanned; the stub 9 was dropped in the pool.
    assert_eq!(summary.scanned, 3);
    assert_eq!(summary.stub_roots, 1);
    assert_eq!(summary.stories, 2);
    assert_eq!(summary.missing_children, 1);
}

#[test]
fn empty_store_builds_an_empty_aggregate() {
    let store = Arc::new(ItemStore::default());
    let (map, summary) = etl().run(store, MemoryBuild::new()).unwrap();
    assert!(map.is_empty());
    assert_eq!(summary.scanned, 0);
}

/// Sink that records accepted keys and asserts strict monotonicity itself.
#[derive(Default)]
struct RecordingSink {
    last: Option<u64>,
    keys: Vec<u64>,
}

impl OrderedBuild for RecordingSink {
    type Output = Vec<u64>;

    fn accept(&mut self, key: u64, _record: Record) -> Result<()> {
        if let Some(prev) = self.last {
            assert!(key > prev, "key {} accepted after {}", key, prev);
        }
        self.last = Some(key);
        self.keys.push(key);
        Ok(())
    }

    fn finalize(self) -> Result<Vec<u64>> {
        Ok(self.keys)
    }
}

#[test]
fn aggregator_restores_key_order_across_many_workers() {
    let lines = synth_lines(120);
    let store = Arc::new(ItemStore::from_items(
        lines.iter().map(|l| serde_json::from_str(l).unwrap()),
    ));
    let (keys, summary) = etl()
        .workers(50)
        .channel_capacity(8)
        .run(store, RecordingSink::default())
        .unwrap();
    assert_eq!(keys.len(), 120);
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(summary.stories, 120);
}

#[test]
fn pool_size_does_not_change_output_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("items.jsonl");
    write_ndjson_lines(&src, &synth_lines(40));

    let mut outputs = Vec::new();
    for workers in [1usize, 50] {
        let etl = etl().workers(workers);
        let items = Arc::new(etl.load_items(&src).unwrap());
        let dst = dir.path().join(format!("threads_{workers}.jsonl"));
        let sink = etl.jsonl_sink(&dst).unwrap();
        let (written, _) = etl.run(items, sink).unwrap();
        assert_eq!(written, 40);
        outputs.push(fs::read(&dst).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn jsonl_sink_writes_sorted_lines_and_commits_on_finalize() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("items.jsonl");
    write_ndjson_lines(&src, &corpus_lines());

    let etl = etl();
    let items = Arc::new(etl.load_items(&src).unwrap());
    let dst = dir.path().join("threads.jsonl");
    let sink = etl.jsonl_sink(&dst).unwrap();
    let (written, _) = etl.run(items, sink).unwrap();
    assert_eq!(written, 2);

    let body = fs::read_to_string(&dst).unwrap();
    let ids: Vec<i64> = body
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, [1, 10]);
}

#[test]
fn memory_build_rejects_out_of_order_keys() {
    let rec = {
        let store = Arc::new(ItemStore::from_items([item(
            json!({"id":1,"type":"story","time":1}),
        )]));
        let (map, _) = etl().run(store, MemoryBuild::new()).unwrap();
        map[&1].clone()
    };
    let mut build = MemoryBuild::new();
    build.accept(5, rec.clone()).unwrap();
    assert!(build.accept(5, rec.clone()).is_err());
    assert!(build.accept(3, rec).is_err());
}

#[test]
fn cancelled_run_commits_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("items.jsonl");
    write_ndjson_lines(&src, &corpus_lines());

    let etl = etl();
    let items = Arc::new(etl.load_items(&src).unwrap());
    let dst = dir.path().join("threads.jsonl");
    let sink = etl.jsonl_sink(&dst).unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    let err = etl.run_with_cancel(items, sink, &cancel).unwrap_err();
    assert!(err.to_string().contains("cancelled"));
    assert!(!dst.exists());
}

#[test]
fn depth_cap_aborts_the_whole_pipeline() {
    let store = Arc::new(ItemStore::from_items([
        item(json!({"id":1,"type":"story","time":1,"kids":[2]})),
        item(json!({"id":2,"type":"comment","time":2,"kids":[3]})),
        item(json!({"id":3,"type":"comment","time":3,"kids":[2]})),
    ]));
    let err = etl().max_depth(8).run(store, MemoryBuild::new()).unwrap_err();
    let chain = format!("{:#}", err);
    assert!(chain.contains("transforming item 1"));
    assert!(chain.contains("depth cap"));
}
