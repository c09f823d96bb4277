//! Recursive comment-tree resolution over the flat item collection.

use crate::item::{Item, ItemStore};
use crate::stats::RunStats;
use crate::story::Comment;
use anyhow::{bail, Result};
use std::sync::atomic::Ordering;

/// Resolve `item`'s children into an ordered comment list, recursively.
/// Source list order is preserved; lookup misses and timeless placeholders
/// are skipped and counted, never fatal. `depth_limit` bounds the recursion:
/// real threads never approach it, so running out means the input references
/// itself somewhere and the run must stop.
pub fn resolve_comments(
    item: &Item,
    items: &ItemStore,
    depth_limit: usize,
    stats: &RunStats,
) -> Result<Vec<Comment>> {
    let Some(kids) = item.kids.as_ref() else {
        return Ok(Vec::new());
    };
    if depth_limit == 0 {
        bail!("comment nesting under item {} exceeds the depth cap; input may be cyclic", item.id);
    }
    let mut out = Vec::with_capacity(kids.len());
    for &kid in kids {
        let Some(child) = items.get(kid) else {
            stats.note_missing_child(kid, item.id);
            tracing::warn!("unable to look up {} from {}", kid, item.id);
            continue;
        };
        // Stubs and zombies carry no time; they contribute nothing.
        let Some(time) = child.time else {
            stats.zombies.fetch_add(1, Ordering::Relaxed);
            continue;
        };
        let children = resolve_comments(child, items, depth_limit - 1, stats)?;
        out.push(Comment {
            id: child.id,
            time,
            text: child.text.clone(),
            by: child.by.clone(),
            deleted: child.deleted,
            dead: child.dead,
            comments: children,
        });
    }
    Ok(out)
}
