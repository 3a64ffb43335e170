use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::SourceType;

/// Per-symbol occurrence counts extracted from cleaned text.
/// A BTreeMap keeps serialization order deterministic.
pub type EmojiSummary = BTreeMap<String, u32>;

/// One top-level published content item, normalized from the remote API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub post_id: String,
    pub caption: Option<String>,
    pub media_type: Option<String>,
    pub media_url: Option<String>,
    pub permalink: Option<String>,
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub comments_count: i64,
}

/// A comment or a reply. `parent_comment_id` is None for top-level
/// comments; for replies it names a comment on the same post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: String,
    pub post_id: String,
    pub parent_comment_id: Option<String>,
    pub username: Option<String>,
    pub text: Option<String>,
    #[serde(default)]
    pub like_count: i64,
    pub created_time: Option<DateTime<Utc>>,
}

/// Denormalized per-text-unit row for downstream language analysis.
/// Exactly one is produced per Post and per Comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatTextRecord {
    pub source_type: SourceType,
    pub source_id: String,
    pub post_id: String,
    pub parent_comment_id: Option<String>,
    pub username: Option<String>,
    pub text: Option<String>,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub emoji_summary: EmojiSummary,
    pub created_time: Option<DateTime<Utc>>,
}
