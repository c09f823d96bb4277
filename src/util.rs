//! Shared plumbing: one-time tracing setup and file operations that retry
//! across transient I/O errors.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
    });
}

/// Transient/retriable I/O errors often seen on Windows when filter drivers
/// (AV/backup), USB/NAS volumes, or sharing violations occur.
fn is_retriable_io_error(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(5 | 21 | 32 | 33 | 225 | 433 | 1006 | 1117 | 1224)
    )
}

/// Run `op`, retrying transient failures with linear backoff.
fn with_backoff<T>(tries: usize, delay_ms: u64, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut last_err: Option<io::Error> = None;
    for i in 0..tries.max(1) {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if is_retriable_io_error(&e) => {
                last_err = Some(e);
                sleep(Duration::from_millis(delay_ms.saturating_mul((i + 1) as u64)));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "retries exhausted")))
}

/// Open a file with retries/backoff for transient errors.
pub fn open_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    with_backoff(tries, delay_ms, || File::open(path))
}

/// Create a file with retries/backoff for transient errors.
pub fn create_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    with_backoff(tries, delay_ms, || File::create(path))
}

/// Remove a file with retries/backoff. Succeeds if the file doesn't exist.
pub fn remove_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> Result<()> {
    with_backoff(tries, delay_ms, || match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    })
    .with_context(|| format!("remove {}", path.display()))
}

/// Atomically replace `dest` with `tmp`.
pub fn replace_file_atomic_backoff(tmp: &Path, dest: &Path) -> Result<()> {
    let tries = 20usize;
    let delay_ms = 50u64;
    if dest.exists() {
        remove_with_backoff(dest, tries, delay_ms)?;
    }
    with_backoff(tries, delay_ms, || fs::rename(tmp, dest))
        .with_context(|| format!("rename {} -> {}", tmp.display(), dest.display()))
}
