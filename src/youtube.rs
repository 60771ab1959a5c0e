use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use url::form_urlencoded;

use crate::error::{Error, Result};

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

static VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""videoId":"([A-Za-z0-9_-]{11})""#).unwrap());

/// `Ok(None)` when the page has no video id.
#[async_trait]
pub trait VideoLookup: Send + Sync {
    async fn resolve_video_id(&self, query: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone)]
pub struct YoutubeSearch {
    base_url: String,
    client: Client,
}

impl YoutubeSearch {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, "https://www.youtube.com".to_string())
    }

    pub fn with_base_url(client: Client, base_url: String) -> Self {
        Self { base_url, client }
    }

    fn search_url(&self, query: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
        format!("{}/results?search_query={}", self.base_url, encoded)
    }
}

#[async_trait]
impl VideoLookup for YoutubeSearch {
    async fn resolve_video_id(&self, query: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(self.search_url(query))
            .header("User-Agent", USER_AGENT)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::UpstreamStatus {
                service: "youtube",
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        let video_id = extract_video_id(&body);
        if video_id.is_none() {
            tracing::debug!(query, "no video id in search page");
        }
        Ok(video_id)
    }
}

fn extract_video_id(html: &str) -> Option<String> {
    VIDEO_ID_RE
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().to_string())
}
