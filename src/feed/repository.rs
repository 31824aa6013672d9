//! Feed repositories for newsgrab.
//!
//! The repositories own a clone of the pool (it is reference counted) so they
//! can be shared with spawned sweeps as `Arc<dyn GroupStore>` and
//! `Arc<dyn ItemStore>`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::store::{GroupStore, ItemStore};
use super::types::{Group, Item, NewGroup};
use crate::db::{format_timestamp, parse_timestamp};
use crate::{NewsgrabError, Result};

const GROUP_COLUMNS: &str = "g.id, g.user_id, u.chat_id, g.source_name, g.remote_name, g.last_sync_at";

const ITEM_COLUMNS: &str = "id, group_id, remote_item_id, source_name, published_at, created_at";

/// Row type for a group joined with its owner.
#[derive(Debug, Clone, sqlx::FromRow)]
struct GroupRow {
    id: i64,
    user_id: i64,
    chat_id: String,
    source_name: String,
    remote_name: String,
    last_sync_at: String,
}

impl TryFrom<GroupRow> for Group {
    type Error = NewsgrabError;

    fn try_from(row: GroupRow) -> Result<Self> {
        Ok(Group {
            id: row.id,
            owner_id: row.user_id,
            owner_chat_id: row.chat_id,
            source_name: row.source_name,
            remote_name: row.remote_name,
            last_sync_at: parse_timestamp(&row.last_sync_at)?,
        })
    }
}

/// Row type for an item.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ItemRow {
    id: i64,
    group_id: i64,
    remote_item_id: String,
    source_name: String,
    published_at: String,
    created_at: String,
}

impl TryFrom<ItemRow> for Item {
    type Error = NewsgrabError;

    fn try_from(row: ItemRow) -> Result<Self> {
        Ok(Item {
            id: row.id,
            group_id: row.group_id,
            remote_item_id: row.remote_item_id,
            source_name: row.source_name,
            published_at: parse_timestamp(&row.published_at)?,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = NewsgrabError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Repository for tracked groups.
#[derive(Clone)]
pub struct GroupRepository {
    pool: SqlitePool,
}

impl GroupRepository {
    /// Create a new repository instance.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a group, or return the existing one for the same
    /// (owner, source, remote name).
    pub async fn create_or_get(&self, group: &NewGroup) -> Result<Group> {
        let now = format_timestamp(&Utc::now());
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO feed_groups
                (user_id, source_name, remote_name, last_sync_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(group.owner_id)
        .bind(&group.source_name)
        .bind(&group.remote_name)
        .bind(format_timestamp(&group.last_sync_at))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| NewsgrabError::Database(e.to_string()))?;

        self.get_by_key(group.owner_id, &group.source_name, &group.remote_name)
            .await?
            .ok_or_else(|| NewsgrabError::NotFound("group".to_string()))
    }

    /// Get a group by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Group>> {
        let query = format!(
            "SELECT {GROUP_COLUMNS} FROM feed_groups g JOIN users u ON u.id = g.user_id
             WHERE g.id = $1"
        );
        let row = sqlx::query_as::<_, GroupRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| NewsgrabError::Database(e.to_string()))?;

        row.map(Group::try_from).transpose()
    }

    /// Get a group by its natural key.
    pub async fn get_by_key(
        &self,
        owner_id: i64,
        source_name: &str,
        remote_name: &str,
    ) -> Result<Option<Group>> {
        let query = format!(
            "SELECT {GROUP_COLUMNS} FROM feed_groups g JOIN users u ON u.id = g.user_id
             WHERE g.user_id = $1 AND g.source_name = $2 AND g.remote_name = $3"
        );
        let row = sqlx::query_as::<_, GroupRow>(&query)
            .bind(owner_id)
            .bind(source_name)
            .bind(remote_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| NewsgrabError::Database(e.to_string()))?;

        row.map(Group::try_from).transpose()
    }

    /// List groups served by a source (ordered by registration order).
    pub async fn list_by_source(&self, source_name: &str) -> Result<Vec<Group>> {
        let query = format!(
            "SELECT {GROUP_COLUMNS} FROM feed_groups g JOIN users u ON u.id = g.user_id
             WHERE g.source_name = $1
             ORDER BY g.id ASC"
        );
        let rows = sqlx::query_as::<_, GroupRow>(&query)
            .bind(source_name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| NewsgrabError::Database(e.to_string()))?;

        collect(rows)
    }

    /// List a user's groups (ordered by registration order).
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Group>> {
        let query = format!(
            "SELECT {GROUP_COLUMNS} FROM feed_groups g JOIN users u ON u.id = g.user_id
             WHERE g.user_id = $1
             ORDER BY g.id ASC"
        );
        let rows = sqlx::query_as::<_, GroupRow>(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| NewsgrabError::Database(e.to_string()))?;

        collect(rows)
    }

    /// Set the high-water mark of one group.
    pub async fn update_last_sync(&self, id: i64, last_sync_at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE feed_groups SET last_sync_at = $1, updated_at = $2 WHERE id = $3",
        )
        .bind(format_timestamp(&last_sync_at))
        .bind(format_timestamp(&Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| NewsgrabError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Set the high-water mark of every group a user owns.
    pub async fn update_last_sync_by_owner(
        &self,
        owner_id: i64,
        last_sync_at: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE feed_groups SET last_sync_at = $1, updated_at = $2 WHERE user_id = $3",
        )
        .bind(format_timestamp(&last_sync_at))
        .bind(format_timestamp(&Utc::now()))
        .bind(owner_id)
        .execute(&self.pool)
        .await
        .map_err(|e| NewsgrabError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// Delete a group by its natural key. Its items go with it.
    pub async fn delete_by_key(
        &self,
        owner_id: i64,
        source_name: &str,
        remote_name: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM feed_groups WHERE user_id = $1 AND source_name = $2 AND remote_name = $3",
        )
        .bind(owner_id)
        .bind(source_name)
        .bind(remote_name)
        .execute(&self.pool)
        .await
        .map_err(|e| NewsgrabError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Count all groups.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feed_groups")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| NewsgrabError::Database(e.to_string()))?;
        Ok(count)
    }
}

#[async_trait]
impl GroupStore for GroupRepository {
    async fn groups_by_source(&self, source_name: &str) -> Result<Vec<Group>> {
        self.list_by_source(source_name).await
    }

    async fn save_group(&self, group: &Group) -> Result<()> {
        if !self.update_last_sync(group.id, group.last_sync_at).await? {
            // Unsubscribed while the sweep was running.
            debug!(group_id = group.id, "group vanished before save");
        }
        Ok(())
    }
}

/// Repository for persisted items.
#[derive(Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Create a new repository instance.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new item, ignoring if duplicate (same group_id + remote_item_id).
    pub async fn create_or_ignore(
        &self,
        group_id: i64,
        remote_item_id: &str,
        source_name: &str,
        published_at: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO feed_items
                (group_id, remote_item_id, source_name, published_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(group_id)
        .bind(remote_item_id)
        .bind(source_name)
        .bind(format_timestamp(&published_at))
        .bind(format_timestamp(&Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| NewsgrabError::Database(e.to_string()))?;

        if result.rows_affected() > 0 {
            Ok(Some(result.last_insert_rowid()))
        } else {
            Ok(None) // Already existed
        }
    }

    /// Get an item by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Item>> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM feed_items WHERE id = $1");
        let row = sqlx::query_as::<_, ItemRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| NewsgrabError::Database(e.to_string()))?;

        row.map(Item::try_from).transpose()
    }

    /// The newest item of a group by publish time.
    pub async fn most_recent(&self, group_id: i64) -> Result<Option<Item>> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM feed_items
             WHERE group_id = $1
             ORDER BY published_at DESC, id DESC
             LIMIT 1"
        );
        let row = sqlx::query_as::<_, ItemRow>(&query)
            .bind(group_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| NewsgrabError::Database(e.to_string()))?;

        row.map(Item::try_from).transpose()
    }

    /// List a group's items, newest first.
    pub async fn list_by_group(&self, group_id: i64) -> Result<Vec<Item>> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM feed_items
             WHERE group_id = $1
             ORDER BY published_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, ItemRow>(&query)
            .bind(group_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| NewsgrabError::Database(e.to_string()))?;

        collect(rows)
    }

    /// Count items of a group.
    pub async fn count_by_group(&self, group_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feed_items WHERE group_id = $1")
            .bind(group_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| NewsgrabError::Database(e.to_string()))?;
        Ok(count)
    }
}

#[async_trait]
impl ItemStore for ItemRepository {
    async fn create_item(
        &self,
        group_id: i64,
        remote_item_id: &str,
        source_name: &str,
        published_at: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        self.create_or_ignore(group_id, remote_item_id, source_name, published_at)
            .await
    }

    async fn most_recent_item(&self, group_id: i64) -> Result<Option<Item>> {
        self.most_recent(group_id).await
    }
}
