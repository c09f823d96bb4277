//! Run diagnostics: tolerated-skip counters shared across pipeline threads,
//! and the summary snapshot handed back to callers.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

// Only a sample of missing-child pairs is retained; the count stays exact.
const MISSING_SAMPLE_CAP: usize = 64;

#[derive(Debug, Default)]
pub struct RunStats {
    pub(crate) scanned: AtomicU64,
    pub(crate) stories: AtomicU64,
    pub(crate) stub_roots: AtomicU64,
    pub(crate) zombies: AtomicU64,
    pub(crate) missing_children: AtomicU64,
    missing_sample: Mutex<Vec<(u64, u64)>>,
}

impl RunStats {
    pub(crate) fn note_missing_child(&self, child: u64, parent: u64) {
        self.missing_children.fetch_add(1, Ordering::Relaxed);
        let mut sample = self.missing_sample.lock();
        if sample.len() < MISSING_SAMPLE_CAP {
            sample.push((child, parent));
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            scanned: self.scanned.load(Ordering::Relaxed),
            stories: self.stories.load(Ordering::Relaxed),
            stub_roots: self.stub_roots.load(Ordering::Relaxed),
            zombies: self.zombies.load(Ordering::Relaxed),
            missing_children: self.missing_children.load(Ordering::Relaxed),
            missing_sample: self.missing_sample.lock().clone(),
        }
    }
}

/// Plain snapshot of a finished (or aborted) run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub scanned: u64,
    pub stories: u64,
    pub stub_roots: u64,
    pub zombies: u64,
    pub missing_children: u64,
    /// First few (child key, parent key) lookup misses.
    pub missing_sample: Vec<(u64, u64)>,
}
