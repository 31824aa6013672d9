//! Feed module for newsgrab.
//!
//! This module provides:
//! - Group and item types
//! - The `FeedSource` capability and its VK and RSS adapters
//! - Group/item store contracts with SQLite and in-memory implementations

mod memory;
mod repository;
pub mod rss;
mod source;
mod store;
mod types;
pub mod vk;

pub use memory::{MemoryGroupStore, MemoryItemStore};
pub use repository::{GroupRepository, ItemRepository};
pub use rss::{RssSource, RSS_SOURCE_NAME};
pub use source::FeedSource;
pub use store::{GroupStore, ItemStore};
pub use types::{Group, Item, NewGroup, RawItem};
pub use vk::{VkSource, VK_SOURCE_NAME};
