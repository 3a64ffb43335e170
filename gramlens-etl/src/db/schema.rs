/// SQL schema for the gramlens target store.
/// Idempotent: every statement is a no-op when the object already exists.
pub const SCHEMA: &str = r#"
-- Posts table (PK = externally assigned content id)
CREATE TABLE IF NOT EXISTS posts (
    post_id TEXT PRIMARY KEY,
    caption TEXT,
    media_type TEXT,
    media_url TEXT,
    permalink TEXT,
    created_time TEXT,
    like_count INTEGER NOT NULL DEFAULT 0,
    comments_count INTEGER NOT NULL DEFAULT 0
);

-- Comments table: top-level comments and replies in one table;
-- parent_comment_id is NULL for top-level comments
CREATE TABLE IF NOT EXISTS comments (
    comment_id TEXT PRIMARY KEY,
    post_id TEXT NOT NULL,
    parent_comment_id TEXT,
    username TEXT,
    text TEXT,
    like_count INTEGER NOT NULL DEFAULT 0,
    created_time TEXT,
    FOREIGN KEY (post_id) REFERENCES posts(post_id) ON DELETE CASCADE,
    FOREIGN KEY (parent_comment_id) REFERENCES comments(comment_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_comments_post_id ON comments(post_id);
CREATE INDEX IF NOT EXISTS idx_comments_parent ON comments(parent_comment_id);

-- Flat text view for downstream language analysis. Surrogate rowid PK;
-- (source_type, source_id) is the natural key used by the upsert.
-- sentiment_label and predicted_sentiment belong to the external model
-- collaborator and are never written by the pipeline.
CREATE TABLE IF NOT EXISTS flat_texts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_type TEXT NOT NULL CHECK(source_type IN ('post', 'comment', 'reply')),
    source_id TEXT NOT NULL,
    post_id TEXT NOT NULL,
    parent_comment_id TEXT,
    username TEXT,
    text TEXT,
    like_count INTEGER NOT NULL DEFAULT 0,
    emoji_summary TEXT NOT NULL DEFAULT '{}',
    created_time TEXT,
    sentiment_label TEXT,
    predicted_sentiment TEXT,
    UNIQUE (source_type, source_id),
    FOREIGN KEY (post_id) REFERENCES posts(post_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_flat_texts_post_id ON flat_texts(post_id);
"#;
