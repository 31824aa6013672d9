//! Subscription management on behalf of chat users.
//!
//! Users are addressed by chat id and created on first contact. A pasted URL
//! is resolved to a feed source and a remote group name:
//!
//! - `https://vk.com/apiclub` becomes the `vk` group `apiclub`
//! - any other http(s) URL becomes an `rss` group keyed by the URL itself

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;
use url::Url;

use crate::db::{Database, UserRepository};
use crate::feed::{rss, Group, GroupRepository, NewGroup, RSS_SOURCE_NAME, VK_SOURCE_NAME};
use crate::sync::Clock;
use crate::{NewsgrabError, Result};

/// Hosts served by the VK source.
const VK_HOSTS: [&str; 3] = ["vk.com", "m.vk.com", "www.vk.com"];

/// Input format of [`SubscriptionService::set_start_date`].
pub const START_DATE_FORMAT: &str = "%d.%m.%Y";

/// A URL resolved to the source that serves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedTarget {
    /// Source name.
    pub source_name: String,
    /// Group identifier understood by that source.
    pub remote_name: String,
}

/// Resolve a user-supplied URL to a feed target.
///
/// A missing scheme is read as `https`.
pub fn resolve_url(input: &str) -> Result<FeedTarget> {
    let input = input.trim();
    if input.is_empty() {
        return Err(NewsgrabError::Validation("URL is empty".to_string()));
    }

    let url = match Url::parse(input) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{input}"))
            .map_err(|e| NewsgrabError::Validation(format!("invalid URL: {}", e)))?,
        Err(e) => return Err(NewsgrabError::Validation(format!("invalid URL: {}", e))),
    };

    if !matches!(url.scheme(), "http" | "https") {
        return Err(NewsgrabError::Validation(format!(
            "unsupported URL scheme: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().unwrap_or_default().to_lowercase();
    if VK_HOSTS.contains(&host.as_str()) {
        let name = url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .ok_or_else(|| NewsgrabError::Validation("VK URL has no group name".to_string()))?;
        return Ok(FeedTarget {
            source_name: VK_SOURCE_NAME.to_string(),
            remote_name: name.to_string(),
        });
    }

    rss::validate_url(url.as_str())?;
    Ok(FeedTarget {
        source_name: RSS_SOURCE_NAME.to_string(),
        remote_name: url.to_string(),
    })
}

/// Parse a `dd.mm.yyyy` date as midnight UTC.
pub fn parse_start_date(input: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(input.trim(), START_DATE_FORMAT).map_err(|_| {
        NewsgrabError::Validation(format!("invalid date '{}', expected dd.mm.yyyy", input))
    })?;
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
}

fn validate_chat_id(chat_id: &str) -> Result<&str> {
    let chat_id = chat_id.trim();
    chat_id
        .parse::<i64>()
        .map_err(|_| NewsgrabError::Validation(format!("invalid chat id '{}'", chat_id)))?;
    Ok(chat_id)
}

/// Service behind the chat commands that manage subscriptions.
pub struct SubscriptionService {
    db: Database,
    groups: GroupRepository,
    clock: Arc<dyn Clock>,
}

impl SubscriptionService {
    /// Create a service over `db`; new groups start at `clock.now()`.
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        let groups = GroupRepository::new(db.pool().clone());
        Self { db, groups, clock }
    }

    /// Subscribe a chat to a URL.
    ///
    /// Subscribing twice returns the existing group unchanged.
    pub async fn add_group(&self, chat_id: &str, url: &str) -> Result<Group> {
        let chat_id = validate_chat_id(chat_id)?;
        let target = resolve_url(url)?;
        let user = UserRepository::new(self.db.pool())
            .find_or_create(chat_id)
            .await?;

        let group = self
            .groups
            .create_or_get(&NewGroup::new(
                user.id,
                target.source_name,
                target.remote_name,
                self.clock.now(),
            ))
            .await?;

        info!(
            chat_id,
            group_id = group.id,
            source = %group.source_name,
            remote = %group.remote_name,
            "group subscribed"
        );
        Ok(group)
    }

    /// Unsubscribe a chat from a URL. Returns whether a group was removed.
    pub async fn remove_group(&self, chat_id: &str, url: &str) -> Result<bool> {
        let chat_id = validate_chat_id(chat_id)?;
        let target = resolve_url(url)?;
        let user = UserRepository::new(self.db.pool())
            .find_or_create(chat_id)
            .await?;

        let removed = self
            .groups
            .delete_by_key(user.id, &target.source_name, &target.remote_name)
            .await?;

        if removed {
            info!(chat_id, source = %target.source_name, remote = %target.remote_name, "group removed");
        }
        Ok(removed)
    }

    /// List a chat's groups in subscription order.
    pub async fn list_groups(&self, chat_id: &str) -> Result<Vec<Group>> {
        let chat_id = validate_chat_id(chat_id)?;
        let user = UserRepository::new(self.db.pool())
            .find_or_create(chat_id)
            .await?;

        self.groups.list_by_owner(user.id).await
    }

    /// Move the high-water mark of all of a chat's groups to a `dd.mm.yyyy`
    /// date. Returns the number of groups updated.
    pub async fn set_start_date(&self, chat_id: &str, date: &str) -> Result<u64> {
        let chat_id = validate_chat_id(chat_id)?;
        let start = parse_start_date(date)?;
        let user = UserRepository::new(self.db.pool())
            .find_or_create(chat_id)
            .await?;

        let updated = self.groups.update_last_sync_by_owner(user.id, start).await?;
        info!(chat_id, updated, start = %start, "start date set");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::ManualClock;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    async fn service() -> SubscriptionService {
        let db = Database::open_in_memory().await.unwrap();
        SubscriptionService::new(db, Arc::new(ManualClock::new(now())))
    }

    #[test]
    fn test_resolve_vk_urls() {
        for url in [
            "https://vk.com/apiclub",
            "https://m.vk.com/apiclub",
            "http://vk.com/apiclub/",
            "vk.com/apiclub",
            "https://VK.com/apiclub?from=search",
        ] {
            let target = resolve_url(url).unwrap();
            assert_eq!(target.source_name, "vk", "{url}");
            assert_eq!(target.remote_name, "apiclub", "{url}");
        }
    }

    #[test]
    fn test_resolve_vk_without_name() {
        let err = resolve_url("https://vk.com/").unwrap_err();
        assert!(matches!(err, NewsgrabError::Validation(_)));
    }

    #[test]
    fn test_resolve_rss_url() {
        let target = resolve_url("https://blog.example.com/feed.xml").unwrap();
        assert_eq!(target.source_name, "rss");
        assert_eq!(target.remote_name, "https://blog.example.com/feed.xml");
    }

    #[test]
    fn test_resolve_rejects_bad_urls() {
        assert!(resolve_url("").is_err());
        assert!(resolve_url("ftp://example.com/feed").is_err());
        assert!(resolve_url("http://localhost/feed").is_err());
        assert!(resolve_url("http://10.0.0.1/feed").is_err());
    }

    #[test]
    fn test_parse_start_date() {
        assert_eq!(
            parse_start_date("05.03.2024").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()
        );
        assert!(parse_start_date("2024-03-05").is_err());
        assert!(parse_start_date("31.02.2024").is_err());
    }

    #[tokio::test]
    async fn test_add_group_is_idempotent() {
        let service = service().await;

        let first = service.add_group("42", "https://vk.com/apiclub").await.unwrap();
        let second = service.add_group("42", "vk.com/apiclub").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.source_name, "vk");
        assert_eq!(first.owner_chat_id, "42");
        assert_eq!(first.last_sync_at, now());
        assert_eq!(service.list_groups("42").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_groups_are_per_user() {
        let service = service().await;
        service.add_group("1", "https://vk.com/a").await.unwrap();
        service.add_group("2", "https://vk.com/a").await.unwrap();
        service
            .add_group("1", "https://example.com/rss")
            .await
            .unwrap();

        let mine = service.list_groups("1").await.unwrap();
        let names: Vec<&str> = mine.iter().map(|g| g.remote_name.as_str()).collect();
        assert_eq!(names, vec!["a", "https://example.com/rss"]);
        assert_eq!(service.list_groups("2").await.unwrap().len(), 1);
        assert!(service.list_groups("3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_group() {
        let service = service().await;
        service.add_group("42", "https://vk.com/apiclub").await.unwrap();

        assert!(service
            .remove_group("42", "https://m.vk.com/apiclub")
            .await
            .unwrap());
        assert!(!service
            .remove_group("42", "https://vk.com/apiclub")
            .await
            .unwrap());
        assert!(service.list_groups("42").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_start_date() {
        let service = service().await;
        service.add_group("42", "https://vk.com/a").await.unwrap();
        service.add_group("42", "https://vk.com/b").await.unwrap();
        service.add_group("7", "https://vk.com/c").await.unwrap();

        let updated = service.set_start_date("42", "01.01.2024").await.unwrap();
        assert_eq!(updated, 2);

        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for group in service.list_groups("42").await.unwrap() {
            assert_eq!(group.last_sync_at, start);
        }
        assert_eq!(
            service.list_groups("7").await.unwrap()[0].last_sync_at,
            now()
        );
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let service = service().await;
        let err = service.add_group("not-a-chat", "https://vk.com/a").await.unwrap_err();
        assert!(matches!(err, NewsgrabError::Validation(_)));

        let err = service.set_start_date("42", "tomorrow").await.unwrap_err();
        assert!(matches!(err, NewsgrabError::Validation(_)));
    }
}
