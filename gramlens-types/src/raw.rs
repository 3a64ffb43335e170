use serde::{Deserialize, Serialize};

/// Wire shapes for the remote Graph-style API, typed at the extractor
/// boundary. Required fields fail deserialization; everything the API is
/// allowed to omit is optional here and normalized by the transformer.

/// Response envelope for the top-level media listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaListResponse {
    #[serde(default)]
    pub data: Vec<RawMedia>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

/// One content item as returned by the media endpoint. The extractor
/// attaches the item's full comment list under `fetched_comments` before
/// writing the raw artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMedia {
    pub id: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub like_count: Option<i64>,
    #[serde(default)]
    pub comments_count: Option<i64>,
    #[serde(default)]
    pub fetched_comments: Vec<RawComment>,
}

/// One comment as returned by the comments endpoint. Replies, when the
/// API inlines them, arrive as a nested `{data: [...]}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawComment {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub like_count: Option<i64>,
    #[serde(default)]
    pub replies: Option<RawReplies>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawReplies {
    #[serde(default)]
    pub data: Vec<RawComment>,
}

/// One page of the paginated comments endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentPage {
    #[serde(default)]
    pub data: Vec<RawComment>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

/// Server-supplied cursor block. Absence of `next` means last page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
}
