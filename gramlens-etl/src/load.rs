use chrono::{DateTime, Utc};
use rusqlite::{params, ErrorCode, OptionalExtension, Transaction};

use gramlens_types::{Comment, FlatTextRecord, Post};

use crate::config::Settings;
use crate::db::Database;
use crate::error::{EtlError, Result};
use crate::stage::{self, StagePaths};

#[derive(Debug, Clone, Copy)]
pub struct LoadSummary {
    pub posts: usize,
    pub comments: usize,
    pub flat_texts: usize,
}

/// Merges staged record collections into the target store with
/// natural-key upserts, so replaying a batch converges instead of
/// duplicating rows.
pub struct Loader {
    db: Database,
}

impl Loader {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn ensure_schema(&self) -> Result<()> {
        self.db.ensure_schema()
    }

    /// Upsert all three collections inside one transaction. Any failure
    /// rolls back the whole call; the three tables move together.
    pub fn load(
        &self,
        posts: &[Post],
        comments: &[Comment],
        flat_texts: &[FlatTextRecord],
    ) -> Result<LoadSummary> {
        let mut conn = self.db.connection()?;
        let tx = conn.transaction()?;

        for post in posts {
            upsert_post(&tx, post)?;
        }
        for comment in comments {
            upsert_comment(&tx, comment)?;
        }
        for flat in flat_texts {
            upsert_flat_text(&tx, flat)?;
        }

        tx.commit()?;
        Ok(LoadSummary {
            posts: posts.len(),
            comments: comments.len(),
            flat_texts: flat_texts.len(),
        })
    }
}

fn non_negative(n: i64) -> i64 {
    n.max(0)
}

fn time_column(t: &Option<DateTime<Utc>>) -> Option<String> {
    t.map(|t| t.to_rfc3339())
}

fn constraint_error(err: rusqlite::Error, context: String) -> EtlError {
    match &err {
        rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation => {
            EtlError::Persistence(format!("{context}: {err}"))
        }
        _ => EtlError::Db(err),
    }
}

fn upsert_post(tx: &Transaction, post: &Post) -> Result<()> {
    tx.execute(
        "INSERT INTO posts (post_id, caption, media_type, media_url, permalink, created_time, like_count, comments_count)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(post_id)
         DO UPDATE SET caption = excluded.caption,
                       media_type = excluded.media_type,
                       media_url = excluded.media_url,
                       permalink = excluded.permalink,
                       created_time = excluded.created_time,
                       like_count = excluded.like_count,
                       comments_count = excluded.comments_count",
        params![
            post.post_id,
            post.caption,
            post.media_type,
            post.media_url,
            post.permalink,
            time_column(&post.created_time),
            non_negative(post.like_count),
            non_negative(post.comments_count),
        ],
    )
    .map_err(|e| constraint_error(e, format!("post {}", post.post_id)))?;
    Ok(())
}

fn upsert_comment(tx: &Transaction, comment: &Comment) -> Result<()> {
    // A reply must reference a top-level comment on the same post, either
    // earlier in this batch (comments precede their replies in staged
    // order) or already loaded. The upsert cannot repair a violation, so
    // it aborts the transaction.
    if let Some(parent_id) = &comment.parent_comment_id {
        let parent_post: Option<String> = tx
            .query_row(
                "SELECT post_id FROM comments WHERE comment_id = ?",
                [parent_id],
                |row| row.get(0),
            )
            .optional()?;
        match parent_post {
            None => {
                return Err(EtlError::Persistence(format!(
                    "reply {} references missing parent comment {}",
                    comment.comment_id, parent_id
                )))
            }
            Some(parent_post) if parent_post != comment.post_id => {
                return Err(EtlError::Persistence(format!(
                    "reply {} on post {} references parent comment {} on post {}",
                    comment.comment_id, comment.post_id, parent_id, parent_post
                )))
            }
            Some(_) => {}
        }
    }

    // Identity fields (post_id, parent_comment_id) stay untouched on
    // conflict; only the mutable fields are overwritten.
    tx.execute(
        "INSERT INTO comments (comment_id, post_id, parent_comment_id, username, text, like_count, created_time)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(comment_id)
         DO UPDATE SET username = excluded.username,
                       text = excluded.text,
                       like_count = excluded.like_count,
                       created_time = excluded.created_time",
        params![
            comment.comment_id,
            comment.post_id,
            comment.parent_comment_id,
            comment.username,
            comment.text,
            non_negative(comment.like_count),
            time_column(&comment.created_time),
        ],
    )
    .map_err(|e| constraint_error(e, format!("comment {}", comment.comment_id)))?;
    Ok(())
}

fn upsert_flat_text(tx: &Transaction, flat: &FlatTextRecord) -> Result<()> {
    let emoji_summary = serde_json::to_string(&flat.emoji_summary)?;
    // sentiment_label and predicted_sentiment are deliberately absent from
    // both column lists: reloads never clobber the collaborator's writes.
    tx.execute(
        "INSERT INTO flat_texts (source_type, source_id, post_id, parent_comment_id, username, text, like_count, emoji_summary, created_time)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(source_type, source_id)
         DO UPDATE SET username = excluded.username,
                       text = excluded.text,
                       like_count = excluded.like_count,
                       emoji_summary = excluded.emoji_summary,
                       created_time = excluded.created_time",
        params![
            flat.source_type.as_str(),
            flat.source_id,
            flat.post_id,
            flat.parent_comment_id,
            flat.username,
            flat.text,
            non_negative(flat.like_count),
            emoji_summary,
            time_column(&flat.created_time),
        ],
    )
    .map_err(|e| {
        constraint_error(
            e,
            format!("flat text {}/{}", flat.source_type.as_str(), flat.source_id),
        )
    })?;
    Ok(())
}

/// Read the staged artifacts and merge them into the database at
/// `settings.database.path`.
pub fn run_load(settings: &Settings) -> Result<LoadSummary> {
    let paths = StagePaths::new(settings);
    let posts: Vec<Post> = stage::read_ndjson(&paths.posts(), "transform")?;
    let comments: Vec<Comment> = stage::read_ndjson(&paths.comments(), "transform")?;
    let flat_texts: Vec<FlatTextRecord> = stage::read_json(&paths.flat_texts(), "transform")?;

    let db = Database::new(&settings.database.path)?;
    let loader = Loader::new(db);
    loader.ensure_schema()?;
    let summary = loader.load(&posts, &comments, &flat_texts)?;

    tracing::info!(
        posts = summary.posts,
        comments = summary.comments,
        flat_texts = summary.flat_texts,
        db = %settings.database.path,
        "load complete"
    );
    Ok(summary)
}
