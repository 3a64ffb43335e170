use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EtlError>;

/// Pipeline-level error kinds. Stage and persistence errors propagate to
/// the caller; per-item remote errors are downgraded inside the extractor
/// and never reach this level.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Required credentials absent. Raised before any request is made.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Non-success response from the remote API.
    #[error("remote API error (status {status}): {body}")]
    Remote { status: u16, body: String },

    /// A staged artifact the stage depends on does not exist.
    #[error("missing input {}: run the {stage} stage first", .path.display())]
    MissingInput { path: PathBuf, stage: &'static str },

    /// The schema definition could not be applied.
    #[error("schema setup failed: {0}")]
    Schema(#[source] rusqlite::Error),

    /// A row violates a constraint the upsert policy cannot resolve.
    /// Aborts (rolls back) the whole load transaction.
    #[error("persistence error: {0}")]
    Persistence(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    Pool(#[from] r2d2::Error),
}
