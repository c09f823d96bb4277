//! Worker pool: N threads turning scanned roots into fully resolved story
//! records.

use crate::item::ItemStore;
use crate::resolve::resolve_comments;
use crate::scan::Scanned;
use crate::schema::Record;
use crate::stats::RunStats;
use crate::story::{thread_schemas, Story};
use anyhow::{bail, Result};
use crossbeam_channel::{Receiver, Sender};
use std::io;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// One pool result per consumed root. `Ok(None)` marks a tolerated skip;
/// the sequence slot must still reach the aggregator.
pub(crate) struct Built {
    pub seq: u64,
    pub id: u64,
    pub payload: Result<Option<Record>>,
}

/// Spawn `count` workers over the shared channels. Each worker consumes
/// until the input channel is closed and drained; the output channel closes
/// when the last worker drops its sender, which is the pool's completion
/// signal.
pub(crate) fn spawn_workers(
    count: usize,
    items: Arc<ItemStore>,
    rx: Receiver<Scanned>,
    tx: Sender<Built>,
    max_depth: usize,
    stats: Arc<RunStats>,
) -> io::Result<Vec<JoinHandle<()>>> {
    (0..count)
        .map(|i| {
            let items = Arc::clone(&items);
            let rx = rx.clone();
            let tx = tx.clone();
            let stats = Arc::clone(&stats);
            thread::Builder::new().name(format!("hnetl-worker-{i}")).spawn(move || {
                for scanned in rx.iter() {
                    let payload = build_root(scanned.id, &items, max_depth, &stats);
                    if tx.send(Built { seq: scanned.seq, id: scanned.id, payload }).is_err() {
                        // Aggregator hung up; stop quietly.
                        return;
                    }
                }
            })
        })
        .collect()
}

fn build_root(id: u64, items: &ItemStore, max_depth: usize, stats: &RunStats) -> Result<Option<Record>> {
    let Some(item) = items.get(id) else {
        // The scanner just saw this key and the store is immutable.
        bail!("item {} disappeared from the source collection", id);
    };
    if item.is_stub() {
        stats.stub_roots.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("skipping stub story {}", id);
        return Ok(None);
    }
    let Some(time) = item.time else {
        // Content without a timestamp: the same partial-data shape as a
        // zombie child.
        stats.zombies.fetch_add(1, Ordering::Relaxed);
        tracing::warn!("skipping story {} with no time", id);
        return Ok(None);
    };
    let comments = resolve_comments(item, items, max_depth, stats)?;
    let story = Story {
        id: item.id,
        time,
        title: item.title.clone(),
        url: item.url.clone(),
        text: item.text.clone(),
        by: item.by.clone(),
        deleted: item.deleted,
        dead: item.dead,
        descendants: item.descendants,
        score: item.score,
        comments,
    };
    let record = thread_schemas().story_record(&story)?;
    Ok(Some(record))
}
