//! Availability endpoint shapes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use staysync_core::{
    BlockedPeriod, BookingId, BookingStatus, DateRange, PropertyId, RangeSource, StayCheck,
    StayRequest, Unavailability, coalesce,
};

/// Flat source kind used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Internal,
    External,
}

/// A blocked range as shown to booking widgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedRange {
    pub start: NaiveDate,
    /// Exclusive.
    pub end: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub source: SourceKind,
    /// Channel label for external ranges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl From<&DateRange> for BookedRange {
    fn from(range: &DateRange) -> Self {
        let (source, channel) = match range.source() {
            RangeSource::Internal => (SourceKind::Internal, None),
            RangeSource::External { label } => (SourceKind::External, Some(label.clone())),
        };
        Self {
            start: range.start(),
            end: range.end(),
            summary: range.summary().map(str::to_string),
            source,
            channel,
        }
    }
}

/// `GET /properties/{id}/availability`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub property_id: PropertyId,
    pub unavailable_dates: Vec<NaiveDate>,
    pub booked_ranges: Vec<BookedRange>,
    /// Continuous periods, for widgets that shade spans rather than days.
    pub blocked_periods: Vec<BlockedPeriod>,
    pub has_external_feed: bool,
    /// Set when the external feed could not be read. Advisory only: the
    /// other fields then reflect bookings alone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_error: Option<String>,
    pub cached_at: DateTime<Utc>,
}

impl AvailabilityResponse {
    pub fn new(
        property_id: PropertyId,
        unavailability: &Unavailability,
        has_external_feed: bool,
        cached_at: DateTime<Utc>,
    ) -> Self {
        Self {
            property_id,
            unavailable_dates: unavailability.unavailable_dates.clone(),
            booked_ranges: unavailability
                .merged_ranges
                .iter()
                .map(BookedRange::from)
                .collect(),
            blocked_periods: coalesce(&unavailability.merged_ranges),
            has_external_feed,
            feed_error: None,
            cached_at,
        }
    }

    pub fn with_feed_error(mut self, error: impl Into<String>) -> Self {
        self.feed_error = Some(error.into());
        self
    }
}

/// Query string of `GET /properties/{id}/availability/check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StayCheckQuery {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default)]
    pub exclude_booking_id: Option<BookingId>,
}

impl From<StayCheckQuery> for StayRequest {
    fn from(query: StayCheckQuery) -> Self {
        let request = StayRequest::new(query.check_in, query.check_out);
        match query.exclude_booking_id {
            Some(id) => request.excluding(id),
            None => request,
        }
    }
}

/// A booking that conflicts with a stay request. Guest details are not
/// exposed on this open endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictingBooking {
    pub id: BookingId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub status: BookingStatus,
}

/// `GET /properties/{id}/availability/check`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StayCheckResponse {
    pub property_id: PropertyId,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
    pub conflicting_bookings: Vec<ConflictingBooking>,
    pub conflicting_blocks: Vec<BookedRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_error: Option<String>,
}

impl StayCheckResponse {
    pub fn new(property_id: PropertyId, request: &StayRequest, check: StayCheck) -> Self {
        Self {
            property_id,
            available: check.available,
            reason: check.reason,
            check_in: request.check_in,
            check_out: request.check_out,
            nights: request.nights().max(0),
            conflicting_bookings: check
                .conflicting_bookings
                .iter()
                .map(|booking| ConflictingBooking {
                    id: booking.id,
                    check_in: booking.check_in,
                    check_out: booking.check_out,
                    status: booking.status,
                })
                .collect(),
            conflicting_blocks: check
                .conflicting_blocks
                .iter()
                .map(BookedRange::from)
                .collect(),
            feed_error: None,
        }
    }

    pub fn with_feed_error(mut self, error: impl Into<String>) -> Self {
        self.feed_error = Some(error.into());
        self
    }
}
