//! Feed source capability.
//!
//! Every external provider is wrapped in a [`FeedSource`]. The sync engine
//! only knows this trait, so adding a provider means implementing it and
//! registering an instance with the scheduler in `main.rs`.

use async_trait::async_trait;

use super::types::RawItem;
use crate::Result;

/// Trait that every feed provider must implement.
///
/// Implementations own authentication and rate limiting. The engine treats
/// every call as potentially slow or failing and never retries on its own.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Stable identifier used to scope groups (e.g. `"vk"`).
    fn name(&self) -> &str;

    /// Number of entries per page; the engine advances the offset by this.
    fn page_size(&self) -> usize;

    /// Fetch one page of entries for a remote group, newest first.
    ///
    /// An empty page means there is nothing at or beyond `offset`.
    async fn fetch_page(&self, remote_name: &str, offset: usize) -> Result<Vec<RawItem>>;

    /// Render the notification text for an entry.
    fn permalink(&self, remote_name: &str, item: &RawItem) -> String {
        match &item.link {
            Some(link) => link.clone(),
            None => format!("{}/{}/{}", self.name(), remote_name, item.remote_id),
        }
    }
}
