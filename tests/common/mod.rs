//! Test helpers for integration tests.
//!
//! Provides a scripted feed source, a recording notifier and database setup.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Barrier;

use newsgrab::feed::NewGroup;
use newsgrab::sync::ManualClock;
use newsgrab::{
    Database, FeedSource, Group, GroupRepository, ItemRepository, NewsgrabError, Notifier,
    RawItem, Result, SyncEngine, UserRepository,
};

/// Noon on the given day of March 2024.
pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()
}

/// A raw item published on `day(d)`.
pub fn raw(id: &str, d: u32) -> RawItem {
    RawItem::new(id, day(d))
}

/// Open a migrated in-memory database.
pub async fn setup_db() -> Database {
    Database::open_in_memory().await.unwrap()
}

/// Create a user and a group, returning the group.
pub async fn create_group(
    db: &Database,
    chat_id: &str,
    source: &str,
    remote: &str,
    last_sync_at: DateTime<Utc>,
) -> Group {
    let user = UserRepository::new(db.pool())
        .find_or_create(chat_id)
        .await
        .unwrap();
    GroupRepository::new(db.pool().clone())
        .create_or_get(&NewGroup::new(user.id, source, remote, last_sync_at))
        .await
        .unwrap()
}

/// Feed source that serves scripted pages keyed by offset.
pub struct ScriptedSource {
    name: String,
    page_size: usize,
    pages: Mutex<HashMap<usize, std::result::Result<Vec<RawItem>, String>>>,
    requests: Mutex<Vec<usize>>,
    gate: Option<Arc<Barrier>>,
}

impl ScriptedSource {
    /// Create a source with no pages; unscripted offsets return an empty page.
    pub fn new(name: &str, page_size: usize) -> Self {
        Self {
            name: name.to_string(),
            page_size,
            pages: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Hold every first-page request until the barrier is full.
    pub fn with_gate(mut self, gate: Arc<Barrier>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Script the page at `offset`.
    pub fn set_page(&self, offset: usize, items: Vec<RawItem>) {
        self.pages.lock().unwrap().insert(offset, Ok(items));
    }

    /// Make the page at `offset` fail with a transport error.
    pub fn fail_page(&self, offset: usize) {
        self.pages
            .lock()
            .unwrap()
            .insert(offset, Err("connection reset by peer".to_string()));
    }

    /// Offsets requested so far.
    pub fn requests(&self) -> Vec<usize> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedSource for ScriptedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    async fn fetch_page(&self, _remote_name: &str, offset: usize) -> Result<Vec<RawItem>> {
        self.requests.lock().unwrap().push(offset);
        if offset == 0 {
            if let Some(gate) = &self.gate {
                gate.wait().await;
            }
        }
        match self.pages.lock().unwrap().get(&offset) {
            Some(Ok(items)) => Ok(items.clone()),
            Some(Err(msg)) => Err(NewsgrabError::Source(msg.clone())),
            None => Ok(Vec::new()),
        }
    }
}

/// Notifier that records every delivery.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    /// All `(destination, text)` pairs delivered so far.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, destination: &str, text: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), text.to_string()));
        Ok(())
    }
}

/// Build an engine over the SQLite repositories of `db`.
pub fn sqlite_engine(
    db: &Database,
    source: Arc<ScriptedSource>,
    notifier: Arc<RecordingNotifier>,
    clock: Arc<ManualClock>,
) -> SyncEngine {
    SyncEngine::new(
        source,
        Arc::new(GroupRepository::new(db.pool().clone())),
        Arc::new(ItemRepository::new(db.pool().clone())),
        notifier,
        clock,
    )
}
