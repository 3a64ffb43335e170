use std::thread;
use std::time::Duration;

use serde::de::DeserializeOwned;

use gramlens_types::{CommentPage, MediaListResponse, RawComment, RawMedia};

use crate::config::{Credentials, Settings};
use crate::error::{EtlError, Result};
use crate::stage::{self, StagePaths};

/// Fixed field projections requested from the remote API.
const MEDIA_FIELDS: &str = "id,caption,media_type,media_url,permalink,timestamp,like_count,comments_count";
const COMMENT_FIELDS: &str = "id,text,username,timestamp,like_count";

#[derive(Debug, Clone, Copy)]
pub struct ExtractSummary {
    pub items: usize,
    pub comments: usize,
    pub failed_items: usize,
}

/// Blocking client for the two read-only content endpoints.
pub struct ApiClient {
    http: reqwest::blocking::Client,
    base_url: String,
    credentials: Credentials,
    page_cooldown: Duration,
}

impl ApiClient {
    /// Fails with a configuration error if credentials are absent, before
    /// any request is made.
    pub fn new(settings: &Settings) -> Result<Self> {
        let credentials = settings.credentials()?;
        Ok(Self {
            http: reqwest::blocking::Client::new(),
            base_url: settings.api.base_url.trim_end_matches('/').to_string(),
            credentials,
            page_cooldown: Duration::from_millis(settings.api.page_cooldown_ms),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let resp = self.http.get(url).query(query).send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(EtlError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json()?)
    }

    /// One request for up to `limit` top-level items.
    pub fn fetch_media(&self, limit: u32) -> Result<Vec<RawMedia>> {
        let url = format!("{}/{}/media", self.base_url, self.credentials.business_id);
        let limit = limit.to_string();
        let resp: MediaListResponse = self.get_json(
            &url,
            &[
                ("fields", MEDIA_FIELDS),
                ("access_token", &self.credentials.access_token),
                ("limit", &limit),
            ],
        )?;
        Ok(resp.data)
    }

    /// Full comment list for one item, following the server-supplied
    /// `paging.next` cursor until the last page.
    pub fn fetch_comments(&self, media_id: &str, page_size: u32) -> Result<Vec<RawComment>> {
        let first_url = format!("{}/{}/comments", self.base_url, media_id);
        let limit = page_size.to_string();
        let first_query = [
            ("fields", COMMENT_FIELDS),
            ("access_token", &*self.credentials.access_token),
            ("limit", &*limit),
        ];
        collect_comment_pages(
            |cursor| match cursor {
                // The `next` URL already carries token and cursor params.
                Some(next) => self.get_json(next, &[]),
                None => self.get_json(&first_url, &first_query),
            },
            || thread::sleep(self.page_cooldown),
        )
    }
}

/// Cursor-following accumulation loop, generic over the page fetch so
/// termination behavior is testable without a network.
///
/// Terminates when a page carries no `next` reference, or when the server
/// re-serves the cursor that produced the current page (a pathological API
/// would otherwise loop forever). `cooldown` runs once per page boundary.
pub fn collect_comment_pages<F, C>(mut fetch: F, mut cooldown: C) -> Result<Vec<RawComment>>
where
    F: FnMut(Option<&str>) -> Result<CommentPage>,
    C: FnMut(),
{
    let mut out = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = fetch(cursor.as_deref())?;
        out.extend(page.data);
        match page.paging.and_then(|p| p.next) {
            None => break,
            Some(next) if cursor.as_deref() == Some(next.as_str()) => break,
            Some(next) => cursor = Some(next),
        }
        cooldown();
    }
    Ok(out)
}

/// Walk the remote API and write the raw-stage artifact: the media list
/// with each item's comment list attached under `fetched_comments`.
///
/// An error fetching one item's comments does not abort the batch; the
/// item proceeds with an empty list and the failure is logged with its id.
pub fn run_extract(settings: &Settings) -> Result<ExtractSummary> {
    let client = ApiClient::new(settings)?;
    let paths = StagePaths::new(settings);

    let mut media = client.fetch_media(settings.api.media_limit)?;

    let mut comments = 0usize;
    let mut failed_items = 0usize;
    for item in &mut media {
        match client.fetch_comments(&item.id, settings.api.comment_page_size) {
            Ok(fetched) => {
                comments += fetched.len();
                item.fetched_comments = fetched;
            }
            Err(err) => {
                failed_items += 1;
                tracing::warn!(
                    media_id = %item.id,
                    error = %err,
                    "comment fetch failed, continuing with empty comment list"
                );
                item.fetched_comments = Vec::new();
            }
        }
    }

    let raw_path = paths.raw_posts();
    stage::write_json_atomic(&raw_path, &media)?;
    tracing::info!(
        items = media.len(),
        comments,
        failed_items,
        path = %raw_path.display(),
        "extract complete"
    );

    Ok(ExtractSummary {
        items: media.len(),
        comments,
        failed_items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gramlens_types::Paging;

    fn comment(id: &str) -> RawComment {
        RawComment {
            id: id.to_string(),
            text: Some(format!("text {id}")),
            username: Some("u1".to_string()),
            timestamp: None,
            like_count: Some(0),
            replies: None,
        }
    }

    fn page(ids: &[&str], next: Option<&str>) -> CommentPage {
        CommentPage {
            data: ids.iter().map(|id| comment(id)).collect(),
            paging: Some(Paging {
                next: next.map(String::from),
            }),
        }
    }

    #[test]
    fn concatenates_pages_in_order_until_next_is_absent() {
        let mut cooldowns = 0;
        let got = collect_comment_pages(
            |cursor| {
                Ok(match cursor {
                    None => page(&["c1", "c2"], Some("p2")),
                    Some("p2") => page(&["c3"], Some("p3")),
                    Some("p3") => page(&["c4"], None),
                    other => panic!("unexpected cursor {other:?}"),
                })
            },
            || cooldowns += 1,
        )
        .unwrap();

        let ids: Vec<_> = got.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["c1", "c2", "c3", "c4"]);
        // One cooldown per page boundary, none after the last page.
        assert_eq!(cooldowns, 2);
    }

    #[test]
    fn repeated_cursor_terminates() {
        let got = collect_comment_pages(
            |cursor| {
                Ok(match cursor {
                    None => page(&["c1"], Some("loop")),
                    // Server keeps serving the same reference.
                    Some("loop") => page(&["c2"], Some("loop")),
                    other => panic!("unexpected cursor {other:?}"),
                })
            },
            || {},
        )
        .unwrap();

        let ids: Vec<_> = got.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["c1", "c2"]);
    }

    #[test]
    fn missing_paging_block_terminates() {
        let got = collect_comment_pages(
            |_| {
                Ok(CommentPage {
                    data: vec![comment("c1")],
                    paging: None,
                })
            },
            || {},
        )
        .unwrap();
        assert_eq!(got.len(), 1);
    }

    #[test]
    fn fetch_error_propagates() {
        let err = collect_comment_pages(
            |_| {
                Err(EtlError::Remote {
                    status: 500,
                    body: "boom".to_string(),
                })
            },
            || {},
        )
        .unwrap_err();
        assert!(matches!(err, EtlError::Remote { status: 500, .. }));
    }
}
