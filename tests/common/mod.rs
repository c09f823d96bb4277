use hnetl::{Item, ItemStore};
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Parse one JSON value into an `Item`, panicking on malformed fixtures.
pub fn item(v: Value) -> Item {
    serde_json::from_value(v).unwrap()
}

/// Write an NDJSON file containing the provided lines.
pub fn write_ndjson_lines(path: &Path, lines: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut f = File::create(path).unwrap();
    for l in lines {
        writeln!(&mut f, "{}", l).unwrap();
    }
}

/// Write a zstd-compressed NDJSON file containing the provided lines.
pub fn write_zst_lines(path: &Path, lines: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let f = File::create(path).unwrap();
    let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
    for l in lines {
        writeln!(&mut enc, "{}", l).unwrap();
    }
    enc.finish().unwrap();
}

/// A small mixed corpus:
/// - story 1 with kids [2, 3, 4, 99]: comment 2 (which has nested child 5),
///   stub comment 3 (no time), comment 4, and 99 which is absent entirely
/// - poll 6 with a populated kids list, pollopt 7, job 8
/// - stub story 9 (id + type only)
/// - story 10 with no comments, top-level comment 11
pub fn corpus_lines() -> Vec<String> {
    vec![
        json!({"id":1,"type":"story","time":100,"by":"ada","title":"Threaded","kids":[2,3,4,99],"score":42,"descendants":3}).to_string(),
        json!({"id":2,"type":"comment","time":101,"by":"bo","text":"first","kids":[5]}).to_string(),
        json!({"id":3,"type":"comment"}).to_string(),
        json!({"id":4,"type":"comment","time":103,"by":"cy","text":"third"}).to_string(),
        json!({"id":5,"type":"comment","time":104,"by":"di","text":"nested"}).to_string(),
        json!({"id":6,"type":"poll","time":105,"by":"ed","title":"Poll?","kids":[7]}).to_string(),
        json!({"id":7,"type":"pollopt","time":106,"text":"option"}).to_string(),
        json!({"id":8,"type":"job","time":107,"title":"Hiring"}).to_string(),
        json!({"id":9,"type":"story"}).to_string(),
        json!({"id":10,"type":"story","time":110,"by":"eve","title":"Quiet","text":"no comments"}).to_string(),
        json!({"id":11,"type":"comment","time":111,"by":"fay","text":"orphan top-level"}).to_string(),
    ]
}

pub fn make_store() -> ItemStore {
    ItemStore::from_items(corpus_lines().iter().map(|l| serde_json::from_str(l).unwrap()))
}

/// Synthetic corpus with uneven per-story comment counts, so worker
/// completion order varies with pool size.
pub fn synth_lines(stories: u64) -> Vec<String> {
    let mut lines = Vec::new();
    for i in 1..=stories {
        let base = i * 1000;
        let k = (i % 7) + 1;
        let kids: Vec<u64> = (1..=k).map(|j| base + j).collect();
        lines.push(
            json!({
                "id": base, "type": "story", "time": base, "by": format!("u{i}"),
                "title": format!("story {i}"), "kids": kids, "score": i
            })
            .to_string(),
        );
        for j in 1..=k {
            lines.push(
                json!({
                    "id": base + j, "type": "comment", "time": base + j,
                    "by": format!("c{j}"), "text": "comment body"
                })
                .to_string(),
            );
        }
    }
    lines
}
