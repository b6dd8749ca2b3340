//! HTTP service for property availability and calendar reconciliation.
//!
//! This crate provides the staysync server that handles:
//! - Guest-facing availability, merged from bookings and external feeds
//! - The owner calendar view with overlap suppression
//! - On-demand sync of a property's external iCalendar feed
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use staysync_feeds::{FeedConfig, HttpFeedFetcher};
//! use staysync_server::{AccessPolicy, AppState, InMemoryStore, SyncService, router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryStore::new());
//!     let fetcher = Arc::new(HttpFeedFetcher::new(FeedConfig::default())?);
//!     let sync = SyncService::new(store.clone(), store, fetcher);
//!     let state = AppState::new(sync, AccessPolicy::default(), "no-store")?;
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, router(state, true)).await?;
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod cli;
mod config;
mod error;
mod handler;
pub mod repository;
mod signals;
mod sync;

#[cfg(test)]
mod testing;

pub use access::{AccessPolicy, AccessToken, Caller, Role};
pub use config::{
    AccessSettings, CalendarSettings, DataSettings, FeedSettings, HttpSettings,
    MAX_FEED_TIMEOUT_SECS, ServerConfig,
};
pub use error::{ServerError, ServerResult};
pub use handler::{AppState, Clock, DEFAULT_DEGRADED_CACHE_CONTROL, router};
pub use repository::{
    BookingRepository, InMemoryStore, PropertyRepository, RepositoryError, RepositoryResult,
};
pub use signals::{ShutdownSignal, SignalHandler};
pub use sync::{DEFAULT_LOOKBACK_DAYS, PropertyFeed, SyncService};
