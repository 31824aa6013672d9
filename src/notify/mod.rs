//! Notification delivery.

mod telegram;

use async_trait::async_trait;

use crate::Result;

pub use telegram::TelegramNotifier;

/// Delivers one rendered notification to one destination.
///
/// The sync engine calls this once per newly stored item, in discovery order.
/// Errors are logged by the caller and never roll back the stored item.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send `text` to `destination` (a chat id for chat-based notifiers).
    async fn notify(&self, destination: &str, text: &str) -> Result<()>;
}
