//! RSS/Atom feed source with security measures.
//!
//! The remote group name of an RSS group is the feed URL itself. A feed has
//! no server-side paging, so the document is downloaded for the first page and
//! its dated entries are kept per URL for the later pages of the same walk.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use feed_rs::parser;
use reqwest::Client;

use super::source::FeedSource;
use super::types::RawItem;
use crate::config::RssConfig;
use crate::{NewsgrabError, Result};

/// Source name under which RSS groups are stored.
pub const RSS_SOURCE_NAME: &str = "rss";

/// [`FeedSource`] for RSS and Atom documents.
pub struct RssSource {
    client: Client,
    page_size: usize,
    max_feed_size: u64,
    /// Entries of the last download of each feed, newest first.
    entries: Mutex<HashMap<String, Vec<RawItem>>>,
}

impl RssSource {
    /// Create a source from configuration and a shared HTTP client.
    pub fn new(config: &RssConfig, client: Client) -> Self {
        Self {
            client,
            page_size: config.page_size,
            max_feed_size: config.max_feed_size_bytes,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, url: &str) -> Option<Vec<RawItem>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(url).cloned()
    }

    fn remember(&self, url: &str, items: Vec<RawItem>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(url.to_string(), items);
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        validate_url(url)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NewsgrabError::Source(format!("failed to fetch feed: {}", e)))?;

        if !response.status().is_success() {
            return Err(NewsgrabError::Source(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            check_size(content_length, self.max_feed_size)?;
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| NewsgrabError::Source(format!("failed to read response: {}", e)))?;

        check_size(bytes.len() as u64, self.max_feed_size)?;

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl FeedSource for RssSource {
    fn name(&self) -> &str {
        RSS_SOURCE_NAME
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    /// The first page always downloads the feed. Later pages reuse the
    /// entries of that download, falling back to a fresh one if none is kept.
    async fn fetch_page(&self, remote_name: &str, offset: usize) -> Result<Vec<RawItem>> {
        if offset > 0 {
            if let Some(entries) = self.cached(remote_name) {
                return Ok(page(entries, offset, self.page_size));
            }
        }

        let bytes = self.download(remote_name).await?;
        let entries = parse_feed(&bytes)?;
        self.remember(remote_name, entries.clone());
        Ok(page(entries, offset, self.page_size))
    }
}

fn check_size(size: u64, max: u64) -> Result<()> {
    if size > max {
        return Err(NewsgrabError::Source(format!(
            "feed too large: {} bytes (max {} bytes)",
            size, max
        )));
    }
    Ok(())
}

/// Validate a feed URL for SSRF protection.
///
/// This function checks that:
/// - The URL uses http or https scheme
/// - The host is not a private/loopback address
/// - The host is not a reserved hostname
pub fn validate_url(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url)
        .map_err(|e| NewsgrabError::Validation(format!("invalid URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(NewsgrabError::Validation(format!(
                "unsupported URL scheme: {}",
                scheme
            )));
        }
    }

    let host = parsed
        .host()
        .ok_or_else(|| NewsgrabError::Validation("URL has no host".to_string()))?;

    let ip = match host {
        url::Host::Domain(domain) => {
            if is_forbidden_hostname(domain) {
                return Err(NewsgrabError::Validation(format!(
                    "forbidden host: {}",
                    domain
                )));
            }
            return Ok(());
        }
        url::Host::Ipv4(ipv4) => IpAddr::V4(ipv4),
        url::Host::Ipv6(ipv6) => IpAddr::V6(ipv6),
    };

    if is_private_ip(&ip) {
        return Err(NewsgrabError::Validation(format!(
            "private IP address not allowed: {}",
            ip
        )));
    }

    Ok(())
}

fn is_forbidden_hostname(host: &str) -> bool {
    const FORBIDDEN_SUFFIXES: [&str; 7] = [
        ".local",
        ".localhost",
        ".internal",
        ".intranet",
        ".corp",
        ".home",
        ".lan",
    ];

    let host = host.to_lowercase();
    host == "localhost" || FORBIDDEN_SUFFIXES.iter().any(|s| host.ends_with(s))
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            ipv4.is_loopback()
                || ipv4.is_private()
                || ipv4.is_link_local()
                || ipv4.is_broadcast()
                || ipv4.is_unspecified()
                // Documentation: 192.0.2.0/24, 198.51.100.0/24, 203.0.113.0/24
                || matches!(octets, [192, 0, 2, _] | [198, 51, 100, _] | [203, 0, 113, _])
        }
        IpAddr::V6(ipv6) => {
            let first = ipv6.segments()[0];
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                // Unique local fc00::/7, link-local fe80::/10
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}

/// Parse feed bytes into dated entries, newest first.
///
/// Entries without a published or updated date are dropped since they can
/// never be compared against a cursor.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<RawItem>> {
    let feed = parser::parse(bytes)
        .map_err(|e| NewsgrabError::Decode(format!("failed to parse feed: {}", e)))?;

    let mut items: Vec<RawItem> = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let published_at = entry.published.or(entry.updated)?;
            let item = RawItem::new(entry.id, published_at);
            Some(match entry.links.into_iter().next() {
                Some(link) => item.with_link(link.href),
                None => item,
            })
        })
        .collect();

    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    Ok(items)
}

fn page(items: Vec<RawItem>, offset: usize, page_size: usize) -> Vec<RawItem> {
    items.into_iter().skip(offset).take(page_size).collect()
}
