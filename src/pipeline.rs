//! Top-level fan-out/fan-in pipeline: scan → worker pool → ordered
//! aggregation.

use crate::aggregate::run_aggregator;
use crate::config::PipelineOptions;
use crate::item::ItemStore;
use crate::pool::spawn_workers;
use crate::scan::scan_roots;
use crate::sink::{JsonlBuild, OrderedBuild};
use crate::stats::{RunStats, RunSummary};
use crate::util::init_tracing_once;
use anyhow::{bail, Context, Result};
use crossbeam_channel::bounded;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Cooperative cancellation: the scanner stops emitting, in-flight workers
/// drain, and the aggregator discards its partial state before any commit
/// can reach the destination.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// The thread-stitching pipeline, configured builder-style.
#[derive(Clone, Debug)]
pub struct HackerNewsETL {
    opts: PipelineOptions,
}

impl HackerNewsETL {
    pub fn new() -> Self {
        Self { opts: PipelineOptions::default() }
    }

    // -------- Builder methods --------
    pub fn workers(mut self, n: usize) -> Self { self.opts = self.opts.with_workers(n); self }
    pub fn channel_capacity(mut self, n: usize) -> Self { self.opts = self.opts.with_channel_capacity(n); self }
    pub fn reorder_capacity(mut self, n: usize) -> Self { self.opts = self.opts.with_reorder_capacity(n); self }
    pub fn max_depth(mut self, n: usize) -> Self { self.opts = self.opts.with_max_depth(n); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_label(mut self, label: impl Into<String>) -> Self { self.opts = self.opts.with_progress_label(label); self }
    pub fn progress_every(mut self, n: u64) -> Self { self.opts = self.opts.with_progress_every(n); self }
    pub fn io_read_buffer(mut self, bytes: usize) -> Self { self.opts = self.opts.with_io_read_buffer(bytes); self }
    pub fn io_write_buffer(mut self, bytes: usize) -> Self { self.opts = self.opts.with_io_write_buffer(bytes); self }

    /// Load and validate the source collection. Fails before any pipeline
    /// thread starts when the source is unreadable.
    pub fn load_items(&self, path: &Path) -> Result<ItemStore> {
        init_tracing_once();
        ItemStore::load(path, self.opts.read_buffer_bytes)
            .with_context(|| format!("invalid source collection {}", path.display()))
    }

    /// Open the NDJSON destination sink. Validated up front; nothing lands
    /// on the destination path until the build finalizes.
    pub fn jsonl_sink(&self, dest: &Path) -> Result<JsonlBuild> {
        JsonlBuild::create(dest, self.opts.write_buffer_bytes)
            .with_context(|| format!("invalid destination {}", dest.display()))
    }

    pub fn run<S: OrderedBuild>(&self, items: Arc<ItemStore>, sink: S) -> Result<(S::Output, RunSummary)> {
        self.run_with_cancel(items, sink, &CancelToken::new())
    }

    /// Run the full pipeline: one scanner thread, `workers` pool threads,
    /// ordered aggregation on the calling thread. Every thread is joined
    /// before returning, success or not.
    pub fn run_with_cancel<S: OrderedBuild>(
        &self,
        items: Arc<ItemStore>,
        sink: S,
        cancel: &CancelToken,
    ) -> Result<(S::Output, RunSummary)> {
        init_tracing_once();
        let stats = Arc::new(RunStats::default());
        let max_key = items.max_key().unwrap_or(0);

        let (scan_tx, scan_rx) = bounded(self.opts.channel_capacity);
        let (built_tx, built_rx) = bounded(self.opts.channel_capacity);

        let scanner = {
            let items = Arc::clone(&items);
            let stats = Arc::clone(&stats);
            let cancel = cancel.clone();
            thread::Builder::new()
                .name("hnetl-scanner".to_string())
                .spawn(move || scan_roots(&items, scan_tx, &cancel, &stats))
                .context("spawn scanner thread")?
        };
        let workers = spawn_workers(
            self.opts.workers,
            Arc::clone(&items),
            scan_rx,
            built_tx,
            self.opts.max_depth,
            Arc::clone(&stats),
        )
        .context("spawn worker threads")?;

        let result = run_aggregator(built_rx, sink, &self.opts, &stats, max_key, cancel);

        // The aggregator's receiver is gone once it returns, which unwinds
        // the upstream stages; join everything before reporting.
        let mut panicked = false;
        for handle in workers {
            panicked |= handle.join().is_err();
        }
        panicked |= scanner.join().is_err();

        let output = result?;
        if panicked {
            bail!("pipeline thread panicked");
        }
        Ok((output, stats.summary()))
    }
}

impl Default for HackerNewsETL {
    fn default() -> Self {
        Self::new()
    }
}
