//! Post DTOs.
//!
//! - `CreatePost`: body of POST /post, content as lines or text
//! - `Post`: stored row with `meta` decoded back to JSON
//! - `PostEnvelope`: the `{ post: ... }` wrapper used by POST and PUT

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Separator used when joining content lines.
pub const NEWLINE: &str = "\n";

/// Maximum length of the short text columns.
pub const SHORT_TEXT_LIMIT: usize = 150;

#[derive(Debug, Clone, Deserialize)]
pub struct PostEnvelope<T> {
    pub post: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostContent {
    Lines(Vec<String>),
    Text(String),
}

impl PostContent {
    pub fn joined(&self) -> String {
        match self {
            PostContent::Lines(lines) => lines.join(NEWLINE),
            PostContent::Text(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePost {
    pub title: Option<String>,
    pub content: Option<PostContent>,
    pub source: Option<String>,
    pub date: Option<NaiveDate>,
    pub meta: Option<Value>,
    pub html: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedPost {
    pub id: i64,
    #[serde(flatten)]
    pub post: CreatePost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: Option<String>,
    pub source: Option<String>,
    pub date: Option<NaiveDate>,
    pub content: Option<String>,
    pub html: Option<String>,
    pub meta: Value,
}

/// Raw row as stored, before `meta` is decoded.
#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: i64,
    pub title: Option<String>,
    pub source: Option<String>,
    pub date: Option<NaiveDate>,
    pub content: Option<String>,
    pub html: Option<String>,
    pub meta: Option<String>,
}

/// Equality filter over post columns. `None` matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter(pub Option<Map<String, Value>>);

impl PostFilter {
    #[cfg(test)]
    pub fn all() -> Self {
        Self(None)
    }

    /// The filter as echoed back to the client: the mapping, or `true`.
    pub fn echo(&self) -> Value {
        match &self.0 {
            Some(map) => Value::Object(map.clone()),
            None => Value::Bool(true),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<Post>,
    pub query: Value,
    pub newline: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowsAffected {
    pub rows_affected: usize,
}
