//! Explicit outcome of one feed sync.

use staysync_core::DateRange;
use tracing::{debug, warn};

use crate::channel::{DEFAULT_CHANNEL_LABEL, channel_for_url};
use crate::error::FeedError;
use crate::fetcher::FeedFetcher;
use crate::ics::{ParsedFeed, parse_feed};

/// A successfully fetched and parsed feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedFeed {
    /// Channel label used for entries whose UID names no channel.
    pub label: String,
    pub ranges: Vec<DateRange>,
    pub skipped: usize,
    pub cancelled: usize,
}

impl SyncedFeed {
    fn from_parsed(label: String, parsed: ParsedFeed) -> Self {
        Self {
            label,
            ranges: parsed.ranges,
            skipped: parsed.skipped,
            cancelled: parsed.cancelled,
        }
    }
}

/// What happened when a property's external feed was consulted.
#[derive(Debug)]
pub enum FeedOutcome {
    /// The property has no external calendar.
    NotConfigured,
    Synced(SyncedFeed),
    /// Fetch or parse failed. Availability falls back to bookings alone.
    Failed(FeedError),
}

impl FeedOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self, Self::NotConfigured)
    }

    /// The external ranges; empty unless synced.
    pub fn ranges(&self) -> &[DateRange] {
        match self {
            Self::Synced(feed) => &feed.ranges,
            _ => &[],
        }
    }

    pub fn into_ranges(self) -> Vec<DateRange> {
        match self {
            Self::Synced(feed) => feed.ranges,
            _ => Vec::new(),
        }
    }

    pub fn error(&self) -> Option<&FeedError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Fetches and parses the feed at `url`, if any. Never fails: errors are
/// folded into [`FeedOutcome::Failed`]. Entries longer than `max_nights` are
/// skipped.
pub async fn fetch_outcome(
    fetcher: &dyn FeedFetcher,
    url: Option<&str>,
    max_nights: u32,
) -> FeedOutcome {
    let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
        return FeedOutcome::NotConfigured;
    };

    let label = channel_for_url(url).unwrap_or(DEFAULT_CHANNEL_LABEL);

    let body = match fetcher.fetch(url).await {
        Ok(body) => body,
        Err(err) => {
            let err = err.with_channel(label);
            warn!(
                fetcher = fetcher.name(),
                stage = "fetch_feed",
                error = %err,
                "External feed fetch failed"
            );
            return FeedOutcome::Failed(err);
        }
    };

    match parse_feed(&body, label, max_nights) {
        Ok(parsed) => {
            debug!(
                channel = label,
                ranges = parsed.ranges.len(),
                skipped = parsed.skipped,
                cancelled = parsed.cancelled,
                "External feed synced"
            );
            FeedOutcome::Synced(SyncedFeed::from_parsed(label.to_string(), parsed))
        }
        Err(err) => {
            warn!(stage = "parse_feed", error = %err, "External feed unreadable");
            FeedOutcome::Failed(err)
        }
    }
}
