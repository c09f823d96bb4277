//! Scanner: walks the collection in ascending key order and feeds eligible
//! roots to the worker pool.

use crate::item::{ItemKind, ItemStore};
use crate::pipeline::CancelToken;
use crate::stats::RunStats;
use crossbeam_channel::Sender;
use std::sync::atomic::Ordering;

/// One scanned root. `seq` is the scan-order sequence number the aggregator
/// reorders by; `id` the item key.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Scanned {
    pub seq: u64,
    pub id: u64,
}

/// Emit every story root in key order. Jobs, polls and comments are never
/// emitted, even when they appear as top-level entries. Blocks only on the
/// bounded channel's backpressure; dropping the sender on return closes the
/// channel exactly once.
pub(crate) fn scan_roots(items: &ItemStore, tx: Sender<Scanned>, cancel: &CancelToken, stats: &RunStats) {
    let mut seq = 0u64;
    for (id, item) in items.iter() {
        if cancel.is_cancelled() {
            tracing::debug!("scanner stopping at item {}: cancelled", id);
            break;
        }
        if item.kind != ItemKind::Story {
            continue;
        }
        if tx.send(Scanned { seq, id }).is_err() {
            // Pool side hung up; the pipeline is unwinding.
            break;
        }
        stats.scanned.fetch_add(1, Ordering::Relaxed);
        seq += 1;
    }
}
