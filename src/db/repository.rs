//! User repository for newsgrab.

use sqlx::SqlitePool;

use super::user::User;
use super::{format_timestamp, parse_timestamp};
use crate::{NewsgrabError, Result};

/// Row type for a user from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: i64,
    chat_id: String,
    created_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = NewsgrabError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: row.id,
            chat_id: row.chat_id,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

/// Repository for chat users.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, chat_id, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| NewsgrabError::Database(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by chat ID.
    pub async fn get_by_chat_id(&self, chat_id: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, chat_id, created_at FROM users WHERE chat_id = $1",
        )
        .bind(chat_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| NewsgrabError::Database(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    /// Return the user for a chat ID, creating it on first contact.
    ///
    /// Safe against two first contacts racing: the insert is ignored when the
    /// chat ID already exists and the row is re-read.
    pub async fn find_or_create(&self, chat_id: &str) -> Result<User> {
        sqlx::query("INSERT OR IGNORE INTO users (chat_id, created_at) VALUES ($1, $2)")
            .bind(chat_id)
            .bind(format_timestamp(&chrono::Utc::now()))
            .execute(self.pool)
            .await
            .map_err(|e| NewsgrabError::Database(e.to_string()))?;

        self.get_by_chat_id(chat_id)
            .await?
            .ok_or_else(|| NewsgrabError::NotFound("user".to_string()))
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await
            .map_err(|e| NewsgrabError::Database(e.to_string()))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_find_or_create_creates_once() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());

        let first = repo.find_or_create("1001").await.unwrap();
        let second = repo.find_or_create("1001").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.chat_id, "1001");
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_by_chat_id_missing() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());

        assert!(repo.get_by_chat_id("404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());

        let created = repo.find_or_create("42").await.unwrap();
        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }
}
