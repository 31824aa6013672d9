//! newsgrab - feed grabber
//!
//! Polls subscribed VK walls and RSS/Atom feeds and delivers every new post
//! to its subscriber as a Telegram message.

pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod http;
pub mod logging;
pub mod notify;
pub mod subscription;
pub mod sync;

pub use config::Config;
pub use db::{Database, User, UserRepository};
pub use error::{NewsgrabError, Result};
pub use feed::{
    FeedSource, Group, GroupRepository, GroupStore, Item, ItemRepository, ItemStore, RawItem,
};
pub use notify::{Notifier, TelegramNotifier};
pub use subscription::SubscriptionService;
pub use sync::{Clock, PollScheduler, SchedulerHandle, SyncEngine, SystemClock};
