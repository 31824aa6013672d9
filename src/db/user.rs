//! Chat user model.

use chrono::{DateTime, Utc};

/// A chat user who owns subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Internal user ID.
    pub id: i64,
    /// Destination identifier in the chat service (Telegram chat id).
    pub chat_id: String,
    /// When the user first subscribed.
    pub created_at: DateTime<Utc>,
}
