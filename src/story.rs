//! Transformed thread records: the recursive Story/Comment values the
//! pipeline produces, and their canonical record schemas.

use crate::schema::{FieldKind, Record, Schema, Value};
use anyhow::Result;
use std::sync::{Arc, OnceLock};

/// A comment with its own resolved children. The shape is recursive to
/// whatever depth the source data reaches.
#[derive(Clone, Debug, PartialEq)]
pub struct Comment {
    pub id: u64,
    pub time: i64,
    pub text: Option<String>,
    pub by: Option<String>,
    pub deleted: Option<bool>,
    pub dead: Option<bool>,
    pub comments: Vec<Comment>,
}

/// A fully resolved story thread.
#[derive(Clone, Debug, PartialEq)]
pub struct Story {
    pub id: u64,
    pub time: i64,
    pub title: Option<String>,
    pub url: Option<String>,
    pub text: Option<String>,
    pub by: Option<String>,
    pub deleted: Option<bool>,
    pub dead: Option<bool>,
    pub descendants: Option<i64>,
    pub score: Option<i64>,
    pub comments: Vec<Comment>,
}

/// The two thread schemas, defined once and reused for every record.
/// Declaration order groups the required fields first and the comments slot
/// last; the descriptor reorders into canonical layout.
pub struct ThreadSchemas {
    pub story: Arc<Schema>,
    pub comment: Arc<Schema>,
}

impl ThreadSchemas {
    fn new() -> Self {
        let comment = Schema::define(
            "Comment",
            &[
                ("id", FieldKind::Int),
                ("time", FieldKind::Int),
                ("text", FieldKind::Str),
                ("by", FieldKind::Str),
                ("deleted", FieldKind::Bool),
                ("dead", FieldKind::Bool),
                ("comments", FieldKind::Records),
            ],
        );
        let story = Schema::define(
            "Story",
            &[
                ("id", FieldKind::Int),
                ("time", FieldKind::Int),
                ("title", FieldKind::Str),
                ("url", FieldKind::Str),
                ("text", FieldKind::Str),
                ("by", FieldKind::Str),
                ("deleted", FieldKind::Bool),
                ("dead", FieldKind::Bool),
                ("descendants", FieldKind::Int),
                ("score", FieldKind::Int),
                ("comments", FieldKind::Records),
            ],
        );
        Self { story, comment }
    }

    pub fn story_record(&self, story: &Story) -> Result<Record> {
        let comments = story
            .comments
            .iter()
            .map(|c| self.comment_record(c))
            .collect::<Result<Vec<_>>>()?;
        self.story.instantiate(vec![
            Value::Int(story.id as i64),
            Value::Int(story.time),
            Value::opt_str(story.title.as_deref()),
            Value::opt_str(story.url.as_deref()),
            Value::opt_str(story.text.as_deref()),
            Value::opt_str(story.by.as_deref()),
            Value::opt_bool(story.deleted),
            Value::opt_bool(story.dead),
            Value::opt_int(story.descendants),
            Value::opt_int(story.score),
            Value::Records(comments),
        ])
    }

    pub fn comment_record(&self, comment: &Comment) -> Result<Record> {
        let children = comment
            .comments
            .iter()
            .map(|c| self.comment_record(c))
            .collect::<Result<Vec<_>>>()?;
        self.comment.instantiate(vec![
            Value::Int(comment.id as i64),
            Value::Int(comment.time),
            Value::opt_str(comment.text.as_deref()),
            Value::opt_str(comment.by.as_deref()),
            Value::opt_bool(comment.deleted),
            Value::opt_bool(comment.dead),
            Value::Records(children),
        ])
    }
}

/// Process-wide schema registry.
pub fn thread_schemas() -> &'static ThreadSchemas {
    static SCHEMAS: OnceLock<ThreadSchemas> = OnceLock::new();
    SCHEMAS.get_or_init(ThreadSchemas::new)
}
