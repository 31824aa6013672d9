//! Sync engine.
//!
//! One engine is bound to one feed source. A sweep walks every group of that
//! source, pages through the source newest-first and stores each item
//! published strictly after the group's cursor. The cursor is the publish time
//! of the newest stored item, or the group's `last_sync_at` when it has none,
//! and is re-read from the item store before every page.
//!
//! The engine holds no locks. Overlapping sweeps of the same group are safe
//! because the item store rejects a second `(group_id, remote_item_id)` and
//! the engine only notifies for rows it actually created.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::clock::Clock;
use crate::feed::{FeedSource, Group, GroupStore, ItemStore, RawItem};
use crate::notify::Notifier;
use crate::Result;

/// Counters for one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Groups whose `last_sync_at` was not after the sweep start.
    pub eligible: usize,
    /// Groups synced successfully.
    pub synced: usize,
    /// Groups that failed and will be retried next sweep.
    pub failed: usize,
    /// Items stored by successful groups.
    pub created: usize,
    /// Notifications delivered by successful groups.
    pub notified: usize,
}

/// Counters for one group.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Pages requested from the source.
    pub pages: usize,
    /// Items stored.
    pub created: usize,
    /// Items the store already had.
    pub duplicates: usize,
    /// Notifications delivered.
    pub notified: usize,
    /// Notifications that failed.
    pub notify_failures: usize,
}

/// Synchronizes all groups of one feed source.
pub struct SyncEngine {
    source: Arc<dyn FeedSource>,
    groups: Arc<dyn GroupStore>,
    items: Arc<dyn ItemStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl SyncEngine {
    /// Create an engine bound to `source`.
    pub fn new(
        source: Arc<dyn FeedSource>,
        groups: Arc<dyn GroupStore>,
        items: Arc<dyn ItemStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            groups,
            items,
            notifier,
            clock,
        }
    }

    /// Name of the bound source.
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Sync every eligible group of the bound source.
    ///
    /// Fails only when the group list cannot be read. Per-group failures are
    /// logged, counted in the report and retried on the next sweep.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let source = self.source.name();
        let groups = self.groups.groups_by_source(source).await?;
        let started_at = self.clock.now();

        let mut report = SweepReport::default();
        for group in groups {
            if group.last_sync_at > started_at {
                debug!(source, group_id = group.id, "group not yet due");
                continue;
            }

            report.eligible += 1;
            match self.sync_group(group, started_at).await {
                Ok(outcome) => {
                    report.synced += 1;
                    report.created += outcome.created;
                    report.notified += outcome.notified;
                }
                Err(_) => report.failed += 1,
            }
        }

        info!(
            source,
            eligible = report.eligible,
            synced = report.synced,
            failed = report.failed,
            created = report.created,
            "sweep finished"
        );
        Ok(report)
    }

    /// Fetch new items for one group and, on success, move its
    /// `last_sync_at` to `started_at`.
    ///
    /// On failure the group is left untouched. Items stored before the
    /// failure are kept, so the next attempt resumes from a later cursor.
    pub async fn sync_group(
        &self,
        mut group: Group,
        started_at: DateTime<Utc>,
    ) -> Result<FetchOutcome> {
        let source = self.source.name();

        let outcome = match self.fetch_new_items(&group).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(source, group_id = group.id, remote = %group.remote_name, error = %e, "group sync failed");
                return Err(e);
            }
        };

        group.last_sync_at = started_at;
        if let Err(e) = self.groups.save_group(&group).await {
            warn!(source, group_id = group.id, error = %e, "failed to save group");
            return Err(e);
        }

        debug!(
            source,
            group_id = group.id,
            pages = outcome.pages,
            created = outcome.created,
            duplicates = outcome.duplicates,
            "group synced"
        );
        Ok(outcome)
    }

    /// Page through the source and store every item newer than the cursor.
    ///
    /// Stops at the first item that is not strictly after the cursor, or at
    /// an empty page. A source, cursor or store error aborts the walk.
    pub async fn fetch_new_items(&self, group: &Group) -> Result<FetchOutcome> {
        let page_size = self.source.page_size();
        let mut outcome = FetchOutcome::default();
        let mut offset = 0;

        loop {
            let page = self.source.fetch_page(&group.remote_name, offset).await?;
            outcome.pages += 1;
            if page.is_empty() {
                return Ok(outcome);
            }

            let cursor = self.cursor(group).await?;
            for item in &page {
                if item.published_at <= cursor {
                    return Ok(outcome);
                }
                self.store_item(group, item, &mut outcome).await?;
            }

            offset += page_size;
        }
    }

    async fn cursor(&self, group: &Group) -> Result<DateTime<Utc>> {
        Ok(self
            .items
            .most_recent_item(group.id)
            .await?
            .map(|item| item.published_at)
            .unwrap_or(group.last_sync_at))
    }

    async fn store_item(
        &self,
        group: &Group,
        item: &RawItem,
        outcome: &mut FetchOutcome,
    ) -> Result<()> {
        let created = self
            .items
            .create_item(
                group.id,
                &item.remote_id,
                self.source.name(),
                item.published_at,
            )
            .await?;

        if created.is_none() {
            outcome.duplicates += 1;
            debug!(group_id = group.id, remote_id = %item.remote_id, "item already stored");
            return Ok(());
        }
        outcome.created += 1;

        let text = self.source.permalink(&group.remote_name, item);
        match self.notifier.notify(&group.owner_chat_id, &text).await {
            Ok(()) => outcome.notified += 1,
            Err(e) => {
                outcome.notify_failures += 1;
                warn!(group_id = group.id, remote_id = %item.remote_id, error = %e, "notification failed");
            }
        }
        Ok(())
    }
}
