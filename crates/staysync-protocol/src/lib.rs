//! HTTP request/response types for staysync.
//!
//! All bodies are JSON with camelCase field names. Dates are `YYYY-MM-DD`;
//! range ends are exclusive everywhere.

mod availability;
mod calendar;
mod error;

pub use availability::{
    AvailabilityResponse, BookedRange, ConflictingBooking, SourceKind, StayCheckQuery,
    StayCheckResponse,
};
pub use calendar::{BlockedDate, CalendarEventView, CalendarEventsResponse, SyncResponse};
pub use error::{ErrorCode, ErrorResponse};

use serde::Serialize;

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
