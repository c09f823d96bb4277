//! Fan-in: restore global key order over the pool's out-of-order output and
//! drive the ordered build sink.

use crate::config::PipelineOptions;
use crate::pipeline::CancelToken;
use crate::pool::Built;
use crate::progress::make_count_progress;
use crate::schema::Record;
use crate::sink::OrderedBuild;
use crate::stats::RunStats;
use anyhow::{bail, Context, Result};
use crossbeam_channel::Receiver;
use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

/// A completed slot, keyed by scan sequence. `record` is None for tolerated
/// skips, which still consume their sequence number.
pub(crate) struct Entry {
    pub seq: u64,
    pub id: u64,
    pub record: Option<Record>,
}

/// Holds completed entries until the next expected scan sequence arrives,
/// then releases maximal in-order runs. Bounded: the awaited entry can sit
/// behind a full output channel, so the buffer keeps draining the channel
/// and treats overflow as fatal instead of stalling.
pub(crate) struct ReorderBuffer {
    next: u64,
    cap: usize,
    pending: BTreeMap<u64, Entry>,
}

impl ReorderBuffer {
    pub(crate) fn new(cap: usize) -> Self {
        Self { next: 0, cap, pending: BTreeMap::new() }
    }

    pub(crate) fn admit(&mut self, entry: Entry) -> Result<Vec<Entry>> {
        self.pending.insert(entry.seq, entry);
        if self.pending.len() > self.cap {
            bail!(
                "reorder buffer exceeded {} entries while waiting for sequence {}",
                self.cap,
                self.next
            );
        }
        let mut ready = Vec::new();
        while let Some(e) = self.pending.remove(&self.next) {
            ready.push(e);
            self.next += 1;
        }
        Ok(ready)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn awaiting(&self) -> u64 {
        self.next
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}

/// Consume pool output until the channel closes, feed the sink in strictly
/// ascending key order, then finalize and hand back the aggregate.
pub(crate) fn run_aggregator<S: OrderedBuild>(
    rx: Receiver<Built>,
    mut sink: S,
    opts: &PipelineOptions,
    stats: &RunStats,
    max_key: u64,
    cancel: &CancelToken,
) -> Result<S::Output> {
    let pb = if opts.progress {
        Some(make_count_progress(
            max_key,
            opts.progress_label.as_deref().unwrap_or("Building threads"),
        ))
    } else {
        None
    };
    let start = Instant::now();
    let mut reorder = ReorderBuffer::new(opts.reorder_capacity);
    let mut accepted = 0u64;

    for built in rx.iter() {
        if cancel.is_cancelled() {
            bail!("pipeline cancelled; partial aggregate discarded");
        }
        let Built { seq, id, payload } = built;
        let record = payload.with_context(|| format!("transforming item {}", id))?;
        for entry in reorder.admit(Entry { seq, id, record })? {
            let Some(record) = entry.record else { continue };
            sink.accept(entry.id, record)?;
            stats.stories.fetch_add(1, Ordering::Relaxed);
            accepted += 1;
            if let Some(pb) = &pb {
                pb.set_position(entry.id.min(max_key));
            }
            if accepted % opts.progress_every == 0 {
                let eta = estimate_remaining(start.elapsed(), entry.id, max_key);
                tracing::info!(
                    processed = accepted,
                    last_key = entry.id,
                    max_key,
                    eta = ?eta,
                    "thread build progress"
                );
            }
        }
    }

    if !reorder.is_empty() {
        bail!(
            "pool output closed with {} entries stranded before sequence {}",
            reorder.len(),
            reorder.awaiting()
        );
    }
    if cancel.is_cancelled() {
        bail!("pipeline cancelled; partial aggregate discarded");
    }
    if let Some(pb) = pb {
        pb.finish_with_message("threads built");
    }
    sink.finalize()
}

/// Remaining-time estimate: elapsed scaled by the unprocessed key span.
fn estimate_remaining(elapsed: Duration, last_key: u64, max_key: u64) -> Duration {
    if last_key == 0 {
        return Duration::ZERO;
    }
    elapsed.mul_f64(max_key.saturating_sub(last_key) as f64 / last_key as f64)
}
