//! External calendar feeds for staysync.
//!
//! - [`ics`]: lenient iCalendar parsing into external [`DateRange`]s
//! - [`channel`]: booking channel attribution from UIDs and feed hosts
//! - [`fetcher`]: the [`FeedFetcher`] trait and its reqwest implementation
//! - [`outcome`]: fetch + parse folded into an explicit [`FeedOutcome`]
//!
//! [`DateRange`]: staysync_core::DateRange

pub mod channel;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod ics;
pub mod outcome;

pub use channel::{DEFAULT_CHANNEL_LABEL, channel_for_uid, channel_for_url};
pub use config::FeedConfig;
pub use error::{FeedError, FeedErrorCode, FeedResult};
pub use fetcher::{BoxFuture, FeedFetcher, HttpFeedFetcher, normalize_feed_url};
pub use ics::{
    DEFAULT_MAX_ENTRY_NIGHTS, ParsedFeed, parse, parse_bounded, parse_feed, parse_with_label,
};
pub use outcome::{FeedOutcome, SyncedFeed, fetch_outcome};
