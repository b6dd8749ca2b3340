//! Feed fetcher configuration.

use std::time::Duration;

/// Configuration for [`HttpFeedFetcher`](crate::HttpFeedFetcher).
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Upper bound for one fetch, connect to last body byte.
    pub timeout: Duration,

    /// User agent sent to booking channels.
    pub user_agent: String,

    /// Bodies larger than this are rejected as invalid.
    pub max_body_bytes: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("staysync-calendar-sync/{}", env!("CARGO_PKG_VERSION")),
            max_body_bytes: Self::DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl FeedConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

    /// 5 MiB holds several years of nightly blocks.
    pub const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }
}
