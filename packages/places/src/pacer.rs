//! Waiting between continuation requests.

use std::time::Duration;

use async_trait::async_trait;

/// Decides how long to wait before requesting the next page.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Waits before a continuation request is sent.
    async fn pause(&self);
}

/// Sleeps for a fixed duration before each continuation request.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl FixedDelay {
    /// Creates a pacer that sleeps for `ms` milliseconds.
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }
}

#[async_trait]
impl Pacer for FixedDelay {
    async fn pause(&self) {
        log::debug!("Waiting {:?} for the page token to activate", self.0);
        tokio::time::sleep(self.0).await;
    }
}

/// Does not wait at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Pacer for NoDelay {
    async fn pause(&self) {}
}
