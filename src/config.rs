//! Pipeline tuning knobs with safe defaults and builder chaining.

#[derive(Clone, Debug)]
pub struct PipelineOptions {
    pub workers: usize,             // worker threads in the transformation pool
    pub channel_capacity: usize,    // bound for both pipeline channels
    pub reorder_capacity: usize,    // max out-of-order completions held by the aggregator
    pub max_depth: usize,           // comment nesting cap; exhaustion is fatal
    pub progress: bool,             // show progress bar
    pub progress_label: Option<String>,
    pub progress_every: u64,        // accepted records between progress log lines

    // IO tuning
    pub read_buffer_bytes: usize,   // BufReader capacity
    pub write_buffer_bytes: usize,  // BufWriter capacity
}

impl Default for PipelineOptions {
    fn default() -> Self {
        // Defaults sized for the full dump: 50 workers saturate the tree
        // resolution while the channels keep memory bounded.
        Self {
            workers: 50,
            channel_capacity: 100,
            reorder_capacity: 4096,
            max_depth: 256,
            progress: true,
            progress_label: None,
            progress_every: 1000,
            read_buffer_bytes: 256 * 1024,
            write_buffer_bytes: 256 * 1024,
        }
    }
}

impl PipelineOptions {
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = n.max(1);
        self
    }
    pub fn with_channel_capacity(mut self, n: usize) -> Self {
        self.channel_capacity = n.max(1);
        self
    }
    pub fn with_reorder_capacity(mut self, n: usize) -> Self {
        self.reorder_capacity = n.max(1);
        self
    }
    pub fn with_max_depth(mut self, n: usize) -> Self {
        self.max_depth = n.max(1);
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }
    pub fn with_progress_every(mut self, n: u64) -> Self {
        self.progress_every = n.max(1);
        self
    }

    // IO buffers tuning
    pub fn with_io_read_buffer(mut self, bytes: usize) -> Self {
        self.read_buffer_bytes = bytes.max(8 * 1024);
        self
    }
    pub fn with_io_write_buffer(mut self, bytes: usize) -> Self {
        self.write_buffer_bytes = bytes.max(8 * 1024);
        self
    }
}
