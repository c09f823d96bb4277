//! Ordered build sinks: destinations that accept (key, record) pairs in
//! strictly increasing key order and produce the final aggregate.

use crate::ndjson::NdjsonWriter;
use crate::schema::Record;
use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The destination collaborator. `accept` must see strictly increasing keys;
/// a violation indicates an aggregator bug and is fatal. Nothing is
/// committed until `finalize`.
pub trait OrderedBuild {
    type Output;
    fn accept(&mut self, key: u64, record: Record) -> Result<()>;
    fn finalize(self) -> Result<Self::Output>;
}

fn check_order(last: &mut Option<u64>, key: u64) -> Result<()> {
    if let Some(prev) = *last {
        if key <= prev {
            bail!("ordered build fed out of order: key {} after {}", key, prev);
        }
    }
    *last = Some(key);
    Ok(())
}

/// In-memory aggregate, mainly for tests and small runs.
#[derive(Debug, Default)]
pub struct MemoryBuild {
    last: Option<u64>,
    map: BTreeMap<u64, Record>,
}

impl MemoryBuild {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderedBuild for MemoryBuild {
    type Output = BTreeMap<u64, Record>;

    fn accept(&mut self, key: u64, record: Record) -> Result<()> {
        check_order(&mut self.last, key)?;
        self.map.insert(key, record);
        Ok(())
    }

    fn finalize(self) -> Result<Self::Output> {
        Ok(self.map)
    }
}

/// Key-sorted NDJSON aggregate. Records go to a sibling temp file that is
/// promoted atomically on finalize, so an aborted run leaves the destination
/// untouched.
pub struct JsonlBuild {
    last: Option<u64>,
    dest: PathBuf,
    tmp: PathBuf,
    writer: NdjsonWriter,
    written: u64,
}

impl JsonlBuild {
    pub fn create(dest: &Path, write_buf_bytes: usize) -> Result<Self> {
        let mut tmp = dest.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        let writer = NdjsonWriter::create(&tmp, write_buf_bytes)
            .with_context(|| format!("create {}", tmp.display()))?;
        Ok(Self { last: None, dest: dest.to_path_buf(), tmp, writer, written: 0 })
    }
}

impl OrderedBuild for JsonlBuild {
    type Output = u64;

    fn accept(&mut self, key: u64, record: Record) -> Result<()> {
        check_order(&mut self.last, key)?;
        self.writer
            .write_line(&record.to_json().to_string())
            .with_context(|| format!("write {}", self.tmp.display()))?;
        self.written += 1;
        Ok(())
    }

    fn finalize(self) -> Result<u64> {
        self.writer.finish_atomic(&self.dest)?;
        Ok(self.written)
    }
}
