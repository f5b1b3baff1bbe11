//! Service layer for the watcher application.
//!
//! This module contains the two external collaborators:
//! - The portal that produces records (`PortalClient`)
//! - The notification channel that consumes messages (`TelegramNotifier`)
//!
//! Both sit behind traits so the pipeline can be exercised without a
//! network.

mod portal;
mod telegram;

pub use portal::PortalClient;
pub use telegram::TelegramNotifier;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Record;

/// Upstream producer of scraped records.
///
/// Implementations hide how the records are obtained (login flow, view
/// discovery, table quirks); the pipeline only sees the resulting batch.
/// Any error aborts the cycle before state is touched.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch the current batch of pending messages.
    async fn fetch(&self) -> Result<Vec<Record>>;
}

/// Outbound notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one rendered message. `Err` means the message was lost.
    async fn notify(&self, message: &str) -> Result<()>;
}
