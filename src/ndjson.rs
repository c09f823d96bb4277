//! NDJSON streaming: buffered line reads with transparent zstd
//! decompression, and a writer that can promote its output atomically.

use crate::util::{create_with_backoff, open_with_backoff, replace_file_atomic_backoff};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use zstd::stream::read::Decoder;

fn is_zst(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("zst"))
}

/// Stream `path` line by line, stripping `\r?\n`; `.zst` inputs are
/// decompressed on the fly. Read and decode errors are fatal here: an
/// unreadable source collection must abort before the pipeline starts.
pub fn for_each_line(
    path: &Path,
    read_buf_bytes: usize,
    mut on_line: impl FnMut(&str) -> Result<()>,
) -> Result<()> {
    let file = open_with_backoff(path, 16, 50).with_context(|| format!("open {}", path.display()))?;
    let reader: Box<dyn Read> = if is_zst(path) {
        let mut decoder =
            Decoder::new(file).with_context(|| format!("zstd decoder for {}", path.display()))?;
        // Very large frames need a wider window than the decoder default.
        decoder.window_log_max(31)?;
        Box::new(decoder)
    } else {
        Box::new(file)
    };
    let mut reader = BufReader::with_capacity(read_buf_bytes.max(8 * 1024), reader);

    let mut buf = String::with_capacity(16 * 1024);
    loop {
        buf.clear();
        let n = reader
            .read_line(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') {
                buf.pop();
            }
        }
        on_line(&buf)?;
    }
    Ok(())
}

/// Minimal NDJSON writer with buffering and robust file creation.
/// Callers supply one payload per `write_line`; terminators are added here.
pub struct NdjsonWriter {
    path: PathBuf,
    w: Option<BufWriter<File>>,
}

impl NdjsonWriter {
    pub fn create(path: &Path, buf_bytes: usize) -> io::Result<Self> {
        let f = create_with_backoff(path, 16, 50)?;
        Ok(Self {
            path: path.to_path_buf(),
            w: Some(BufWriter::with_capacity(buf_bytes.max(8 * 1024), f)),
        })
    }

    #[inline]
    pub fn write_line(&mut self, s: &str) -> io::Result<()> {
        if let Some(w) = &mut self.w {
            w.write_all(s.as_bytes())?;
            w.write_all(b"\n")?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> io::Result<()> {
        if let Some(mut w) = self.w.take() {
            w.flush()?;
        }
        Ok(())
    }

    /// Flushes and atomically promotes the temp file to `final_path`.
    /// Use when the writer was created on a temp location.
    pub fn finish_atomic(mut self, final_path: &Path) -> Result<()> {
        if let Some(mut w) = self.w.take() {
            w.flush().with_context(|| format!("flush {}", self.path.display()))?;
        }
        replace_file_atomic_backoff(&self.path, final_path)
    }
}
