//! Feed types for newsgrab.

use chrono::{DateTime, Utc};

/// A tracked remote feed endpoint bound to one owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Group ID.
    pub id: i64,
    /// Owning user ID.
    pub owner_id: i64,
    /// Where notifications for this group are delivered (the owner's chat id).
    pub owner_chat_id: String,
    /// Name of the feed source that serves this group.
    pub source_name: String,
    /// Group identifier understood by the source (VK domain, feed URL).
    pub remote_name: String,
    /// Start of the last successful sweep; the cursor when no item exists yet.
    pub last_sync_at: DateTime<Utc>,
}

/// New group for creation.
#[derive(Debug, Clone)]
pub struct NewGroup {
    /// Owning user ID.
    pub owner_id: i64,
    /// Feed source name.
    pub source_name: String,
    /// Remote group identifier.
    pub remote_name: String,
    /// Initial high-water mark.
    pub last_sync_at: DateTime<Utc>,
}

impl NewGroup {
    /// Create a new group request.
    pub fn new(
        owner_id: i64,
        source_name: impl Into<String>,
        remote_name: impl Into<String>,
        last_sync_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id,
            source_name: source_name.into(),
            remote_name: remote_name.into(),
            last_sync_at,
        }
    }
}

/// A feed entry that has been recognized as new and persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Item ID.
    pub id: i64,
    /// Group this item belongs to.
    pub group_id: i64,
    /// Identifier assigned by the remote source.
    pub remote_item_id: String,
    /// Source the item came from.
    pub source_name: String,
    /// When the remote source published it.
    pub published_at: DateTime<Utc>,
    /// When it was stored.
    pub created_at: DateTime<Utc>,
}

/// An entry as returned by a feed source, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    /// Identifier assigned by the remote source.
    pub remote_id: String,
    /// Publish time.
    pub published_at: DateTime<Utc>,
    /// Author/owner identifier, when the source has one.
    pub owner_id: Option<String>,
    /// Direct link to the entry, when the source provides one.
    pub link: Option<String>,
}

impl RawItem {
    /// Create a raw item with only the required fields.
    pub fn new(remote_id: impl Into<String>, published_at: DateTime<Utc>) -> Self {
        Self {
            remote_id: remote_id.into(),
            published_at,
            owner_id: None,
            link: None,
        }
    }

    /// Set the owner identifier.
    pub fn with_owner_id(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    /// Set the link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}
