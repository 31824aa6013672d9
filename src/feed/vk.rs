//! VK wall source.
//!
//! Pages through `wall.get` for a community or user domain. Posts come back
//! newest first, except that a pinned post leads the first page whatever its
//! age. Pages are re-sorted by date so a pinned post lands where it belongs.

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::source::FeedSource;
use super::types::RawItem;
use crate::config::VkConfig;
use crate::{NewsgrabError, Result};

/// Source name under which VK groups are stored.
pub const VK_SOURCE_NAME: &str = "vk";

/// Public site used for post permalinks.
const VK_SITE: &str = "https://vk.com";

#[derive(Debug, Deserialize)]
struct WallEnvelope {
    response: Option<WallResponse>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct WallResponse {
    #[serde(default)]
    items: Vec<WallPost>,
}

#[derive(Debug, Deserialize)]
struct WallPost {
    id: i64,
    owner_id: i64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error_code: i64,
    error_msg: String,
}

/// [`FeedSource`] backed by the VK API.
pub struct VkSource {
    client: Client,
    base_url: String,
    token: String,
    api_version: String,
    page_size: usize,
}

impl VkSource {
    /// Create a source from configuration and a shared HTTP client.
    pub fn new(config: &VkConfig, client: Client) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            api_version: config.api_version.clone(),
            page_size: config.page_size,
        }
    }

    /// URL of one `wall.get` page.
    pub fn page_url(&self, domain: &str, offset: usize) -> Result<Url> {
        let endpoint = format!("{}/method/wall.get", self.base_url);
        Url::parse_with_params(
            &endpoint,
            &[
                ("v", self.api_version.as_str()),
                ("count", &self.page_size.to_string()),
                ("access_token", self.token.as_str()),
                ("domain", domain),
                ("offset", &offset.to_string()),
            ],
        )
        .map_err(|e| NewsgrabError::Config(format!("invalid VK base URL: {}", e)))
    }
}

#[async_trait]
impl FeedSource for VkSource {
    fn name(&self) -> &str {
        VK_SOURCE_NAME
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    async fn fetch_page(&self, remote_name: &str, offset: usize) -> Result<Vec<RawItem>> {
        let url = self.page_url(remote_name, offset)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NewsgrabError::Source(format!("VK request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(NewsgrabError::Source(format!(
                "VK HTTP error: {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| NewsgrabError::Source(format!("failed to read VK response: {}", e)))?;

        parse_wall_response(&body)
    }

    fn permalink(&self, remote_name: &str, item: &RawItem) -> String {
        match &item.owner_id {
            Some(owner_id) => format!(
                "{}/{}?w=wall{}_{}",
                VK_SITE, remote_name, owner_id, item.remote_id
            ),
            None => format!("{}/{}", VK_SITE, remote_name),
        }
    }
}

/// Decode a `wall.get` response body into raw items, newest first.
pub fn parse_wall_response(body: &[u8]) -> Result<Vec<RawItem>> {
    let envelope: WallEnvelope = serde_json::from_slice(body)
        .map_err(|e| NewsgrabError::Decode(format!("malformed VK response: {}", e)))?;

    if let Some(error) = envelope.error {
        return Err(NewsgrabError::Decode(format!(
            "VK API error {}: {}",
            error.error_code, error.error_msg
        )));
    }

    let response = envelope
        .response
        .ok_or_else(|| NewsgrabError::Decode("VK response has no payload".to_string()))?;

    let mut items = response
        .items
        .into_iter()
        .map(|post| {
            let published_at = DateTime::from_timestamp(post.date, 0).ok_or_else(|| {
                NewsgrabError::Decode(format!("invalid VK post date: {}", post.date))
            })?;
            Ok(RawItem::new(post.id.to_string(), published_at)
                .with_owner_id(post.owner_id.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    Ok(items)
}
