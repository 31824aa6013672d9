//! Store contracts used by the sync engine.
//!
//! The engine relies on the item store's uniqueness on
//! `(group_id, remote_item_id)` instead of locks, so overlapping sweeps can
//! race on the same group without corrupting data.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::types::{Group, Item};
use crate::Result;

/// Persisted tracked groups.
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// All groups served by a source, in a stable store order.
    async fn groups_by_source(&self, source_name: &str) -> Result<Vec<Group>>;

    /// Persist a group's mutable state (`last_sync_at`).
    async fn save_group(&self, group: &Group) -> Result<()>;
}

/// Persisted items; also the cursor store.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Insert an item.
    ///
    /// Returns `Ok(None)` without inserting when `(group_id, remote_item_id)`
    /// already exists.
    async fn create_item(
        &self,
        group_id: i64,
        remote_item_id: &str,
        source_name: &str,
        published_at: DateTime<Utc>,
    ) -> Result<Option<i64>>;

    /// The item with the latest `published_at` for a group.
    async fn most_recent_item(&self, group_id: i64) -> Result<Option<Item>>;
}
