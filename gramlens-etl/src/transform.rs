use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use gramlens_types::{Comment, EmojiSummary, FlatTextRecord, Post, RawComment, RawMedia, SourceType};

use crate::config::Settings;
use crate::error::Result;
use crate::stage::{self, StagePaths};

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Codepoint heuristic for "symbol of interest". Approximate on purpose:
/// it over- and under-counts real emoji, and both bounds are tunable.
const SYMBOL_ORDINAL_THRESHOLD: u32 = 10_000;
const SYMBOL_BLOCK_START: u32 = 0x2600;
const SYMBOL_BLOCK_END: u32 = 0x3300;

#[derive(Debug, Clone, Copy)]
pub struct TransformSummary {
    pub posts: usize,
    pub comments: usize,
    pub flat_texts: usize,
}

#[derive(Debug, Default)]
pub struct TransformOutput {
    pub posts: Vec<Post>,
    pub comments: Vec<Comment>,
    pub flat_texts: Vec<FlatTextRecord>,
}

/// Strip URL-like substrings, collapse whitespace runs, trim. Pure.
pub fn clean_text(s: &str) -> String {
    let no_urls = URL_RE.replace_all(s, "");
    WHITESPACE_RE.replace_all(&no_urls, " ").trim().to_string()
}

fn clean_optional(s: Option<&str>) -> Option<String> {
    s.map(clean_text)
}

/// Count symbol codepoints per distinct symbol. Empty for plain ASCII.
pub fn emoji_summary_from_text(text: &str) -> EmojiSummary {
    let mut summary = EmojiSummary::new();
    for ch in text.chars() {
        let ord = ch as u32;
        if ord > SYMBOL_ORDINAL_THRESHOLD
            || (SYMBOL_BLOCK_START..SYMBOL_BLOCK_END).contains(&ord)
        {
            *summary.entry(ch.to_string()).or_insert(0) += 1;
        }
    }
    summary
}

/// Parse a source timestamp. The API emits RFC 3339 for some surfaces and
/// `+0000`-style offsets for others; anything unparseable becomes None
/// rather than failing the batch.
pub fn parse_timestamp(s: Option<&str>) -> Option<DateTime<Utc>> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn flat_record(
    source_type: SourceType,
    source_id: &str,
    post_id: &str,
    parent_comment_id: Option<&str>,
    username: Option<&str>,
    text: Option<&str>,
    like_count: i64,
    created_time: Option<DateTime<Utc>>,
) -> FlatTextRecord {
    FlatTextRecord {
        source_type,
        source_id: source_id.to_string(),
        post_id: post_id.to_string(),
        parent_comment_id: parent_comment_id.map(String::from),
        username: username.map(String::from),
        text: text.map(String::from),
        like_count,
        emoji_summary: text.map(emoji_summary_from_text).unwrap_or_default(),
        created_time,
    }
}

fn push_comment(
    out: &mut TransformOutput,
    raw: &RawComment,
    post_id: &str,
    parent_comment_id: Option<&str>,
) {
    let text = clean_optional(raw.text.as_deref());
    let created_time = parse_timestamp(raw.timestamp.as_deref());
    let like_count = raw.like_count.unwrap_or(0);
    let source_type = if parent_comment_id.is_some() {
        SourceType::Reply
    } else {
        SourceType::Comment
    };

    out.comments.push(Comment {
        comment_id: raw.id.clone(),
        post_id: post_id.to_string(),
        parent_comment_id: parent_comment_id.map(String::from),
        username: raw.username.clone(),
        text: text.clone(),
        like_count,
        created_time,
    });
    out.flat_texts.push(flat_record(
        source_type,
        &raw.id,
        post_id,
        parent_comment_id,
        raw.username.as_deref(),
        text.as_deref(),
        like_count,
        created_time,
    ));
}

/// Flatten the raw nested documents into independent typed records:
/// one Post row and one flat row per media item, one Comment row and one
/// flat row per comment and per reply (replies nest one level only).
/// Output order mirrors input order.
pub fn transform(raw_items: &[RawMedia]) -> TransformOutput {
    let mut out = TransformOutput::default();

    for item in raw_items {
        let caption = clean_optional(item.caption.as_deref());
        let created_time = parse_timestamp(item.timestamp.as_deref());
        let like_count = item.like_count.unwrap_or(0);

        out.posts.push(Post {
            post_id: item.id.clone(),
            caption: caption.clone(),
            media_type: item.media_type.clone(),
            media_url: item.media_url.clone(),
            permalink: item.permalink.clone(),
            created_time,
            like_count,
            comments_count: item.comments_count.unwrap_or(0),
        });
        out.flat_texts.push(flat_record(
            SourceType::Post,
            &item.id,
            &item.id,
            None,
            None,
            caption.as_deref(),
            like_count,
            created_time,
        ));

        for comment in &item.fetched_comments {
            push_comment(&mut out, comment, &item.id, None);
            if let Some(replies) = &comment.replies {
                for reply in &replies.data {
                    push_comment(&mut out, reply, &item.id, Some(&comment.id));
                }
            }
        }
    }

    out
}

/// Consume the raw artifact and write the three staged outputs.
pub fn run_transform(settings: &Settings) -> Result<TransformSummary> {
    let paths = StagePaths::new(settings);
    let raw_items: Vec<RawMedia> = stage::read_json(&paths.raw_posts(), "extract")?;

    let out = transform(&raw_items);

    stage::write_ndjson_atomic(&paths.posts(), &out.posts)?;
    stage::write_ndjson_atomic(&paths.comments(), &out.comments)?;
    stage::write_json_atomic(&paths.flat_texts(), &out.flat_texts)?;

    let summary = TransformSummary {
        posts: out.posts.len(),
        comments: out.comments.len(),
        flat_texts: out.flat_texts.len(),
    };
    tracing::info!(
        posts = summary.posts,
        comments = summary.comments,
        flat_texts = summary.flat_texts,
        "transform complete"
    );
    Ok(summary)
}
