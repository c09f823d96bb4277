//! Source items: the flat, read-only records of the dump and the keyed
//! collection the pipeline walks.

use crate::ndjson::for_each_line;
use anyhow::{bail, Result};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Item type tag. Tags this tool doesn't know map to `Unknown` instead of
/// failing the whole line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Story,
    Comment,
    Job,
    Poll,
    Pollopt,
    Unknown,
}

impl<'de> Deserialize<'de> for ItemKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(match tag.as_str() {
            "story" => ItemKind::Story,
            "comment" => ItemKind::Comment,
            "job" => ItemKind::Job,
            "poll" => ItemKind::Poll,
            "pollopt" => ItemKind::Pollopt,
            _ => ItemKind::Unknown,
        })
    }
}

/// One raw item as found in the dump. Everything beyond id/type is optional;
/// an item carrying nothing else is a stub placeholder.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Item {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub time: Option<i64>,
    pub by: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub text: Option<String>,
    pub deleted: Option<bool>,
    pub dead: Option<bool>,
    pub descendants: Option<i64>,
    pub score: Option<i64>,
    pub kids: Option<Vec<u64>>,
}

impl Item {
    /// True when the record carries only id + type: a placeholder for an
    /// item whose content never made it into the dump.
    pub fn is_stub(&self) -> bool {
        self.time.is_none()
            && self.by.is_none()
            && self.title.is_none()
            && self.url.is_none()
            && self.text.is_none()
            && self.deleted.is_none()
            && self.dead.is_none()
            && self.descendants.is_none()
            && self.score.is_none()
            && self.kids.is_none()
    }
}

/// Immutable key-ordered item collection: ascending iteration, keyed lookup,
/// max key. Shared read-only across the whole pipeline.
#[derive(Debug, Default)]
pub struct ItemStore {
    items: BTreeMap<u64, Item>,
}

impl ItemStore {
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        Self { items: items.into_iter().map(|i| (i.id, i)).collect() }
    }

    /// Load a collection from an NDJSON file, or from a directory of
    /// `.jsonl`/`.ndjson`/`.zst` files. Later files win on duplicate ids.
    pub fn load(path: &Path, read_buf_bytes: usize) -> Result<Self> {
        let files = discover_input_files(path)?;
        let mut items = BTreeMap::new();
        let mut bad_lines = 0u64;
        for file in &files {
            for_each_line(file, read_buf_bytes, |line| {
                if line.is_empty() {
                    return Ok(());
                }
                match serde_json::from_str::<Item>(line) {
                    Ok(item) => {
                        items.insert(item.id, item);
                    }
                    Err(e) => {
                        bad_lines += 1;
                        tracing::warn!(file = %file.display(), error = %e, "skipping unparseable item line");
                    }
                }
                Ok(())
            })?;
        }
        if bad_lines > 0 {
            tracing::warn!("skipped {} unparseable lines while loading items", bad_lines);
        }
        tracing::info!("loaded {} items from {} file(s)", items.len(), files.len());
        Ok(Self { items })
    }

    #[inline]
    pub fn get(&self, id: u64) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Entries in ascending key order: the collection's native order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Item)> {
        self.items.iter().map(|(&id, item)| (id, item))
    }

    pub fn max_key(&self) -> Option<u64> {
        self.items.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn eligible_input(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(e) if ["jsonl", "ndjson", "zst"].iter().any(|x| e.eq_ignore_ascii_case(x))
    )
}

fn discover_input_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_dir() {
        let mut files: Vec<PathBuf> = WalkDir::new(path)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .filter(|p| eligible_input(p))
            .collect();
        files.sort();
        if files.is_empty() {
            bail!("no .jsonl/.ndjson/.zst files under {}", path.display());
        }
        Ok(files)
    } else if path.is_file() {
        Ok(vec![path.to_path_buf()])
    } else {
        bail!("source {} does not exist", path.display());
    }
}
