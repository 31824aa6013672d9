//! In-memory group and item stores.
//!
//! These mirror the SQLite repositories' semantics (store order, duplicate
//! absorption, newest-by-publish-time) and are used by tests and embedders
//! that do not want a database.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::store::{GroupStore, ItemStore};
use super::types::{Group, Item};
use crate::{NewsgrabError, Result};

fn poisoned<T>(_: T) -> NewsgrabError {
    NewsgrabError::Database("in-memory store lock poisoned".to_string())
}

/// In-memory [`GroupStore`].
#[derive(Clone, Default)]
pub struct MemoryGroupStore {
    groups: Arc<RwLock<Vec<Group>>>,
}

impl MemoryGroupStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group. Insertion order is the store order.
    pub fn insert(&self, group: Group) -> Result<()> {
        self.groups.write().map_err(poisoned)?.push(group);
        Ok(())
    }

    /// Get a group by ID.
    pub fn get(&self, id: i64) -> Result<Option<Group>> {
        let groups = self.groups.read().map_err(poisoned)?;
        Ok(groups.iter().find(|g| g.id == id).cloned())
    }
}

#[async_trait]
impl GroupStore for MemoryGroupStore {
    async fn groups_by_source(&self, source_name: &str) -> Result<Vec<Group>> {
        let groups = self.groups.read().map_err(poisoned)?;
        Ok(groups
            .iter()
            .filter(|g| g.source_name == source_name)
            .cloned()
            .collect())
    }

    async fn save_group(&self, group: &Group) -> Result<()> {
        let mut groups = self.groups.write().map_err(poisoned)?;
        if let Some(stored) = groups.iter_mut().find(|g| g.id == group.id) {
            *stored = group.clone();
        }
        Ok(())
    }
}

/// In-memory [`ItemStore`] with `(group_id, remote_item_id)` uniqueness.
#[derive(Clone, Default)]
pub struct MemoryItemStore {
    items: Arc<RwLock<Vec<Item>>>,
}

impl MemoryItemStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All items of a group, in insertion order.
    pub fn items_for(&self, group_id: i64) -> Result<Vec<Item>> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items
            .iter()
            .filter(|i| i.group_id == group_id)
            .cloned()
            .collect())
    }

    /// Total number of stored items.
    pub fn len(&self) -> Result<usize> {
        Ok(self.items.read().map_err(poisoned)?.len())
    }

    /// Whether the store holds no items.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn create_item(
        &self,
        group_id: i64,
        remote_item_id: &str,
        source_name: &str,
        published_at: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        let mut items = self.items.write().map_err(poisoned)?;
        if items
            .iter()
            .any(|i| i.group_id == group_id && i.remote_item_id == remote_item_id)
        {
            return Ok(None);
        }

        let id = items.len() as i64 + 1;
        items.push(Item {
            id,
            group_id,
            remote_item_id: remote_item_id.to_string(),
            source_name: source_name.to_string(),
            published_at,
            created_at: Utc::now(),
        });
        Ok(Some(id))
    }

    async fn most_recent_item(&self, group_id: i64) -> Result<Option<Item>> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items
            .iter()
            .filter(|i| i.group_id == group_id)
            .max_by_key(|i| (i.published_at, i.id))
            .cloned())
    }
}
