//! Calendar event materialization.
//!
//! Produces presentation-oriented events for an owner's calendar view from
//! the same inputs the availability aggregator uses. Unlike the aggregator,
//! every in-scope booking shows up (whatever its status), and external ranges
//! that overlap a booking are dropped as echoes of that booking.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::booking::{BookingId, BookingRecord, BookingStatus};
use crate::range::{DateRange, spans_overlap};

/// Display colour of a calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorKey {
    Blue,
    Green,
    Gray,
    Red,
    Orange,
}

impl ColorKey {
    /// Background colour as a hex string.
    pub fn background(&self) -> &'static str {
        match self {
            Self::Blue => "#3b82f6",
            Self::Green => "#10b981",
            Self::Gray => "#6b7280",
            Self::Red => "#ef4444",
            Self::Orange => "#f59e0b",
        }
    }

    /// Border colour as a hex string.
    pub fn border(&self) -> &'static str {
        match self {
            Self::Blue => "#2563eb",
            Self::Green => "#059669",
            Self::Gray => "#4b5563",
            Self::Red => "#dc2626",
            Self::Orange => "#d97706",
        }
    }

    /// Text colour as a hex string.
    pub fn text(&self) -> &'static str {
        "#ffffff"
    }
}

impl From<BookingStatus> for ColorKey {
    fn from(status: BookingStatus) -> Self {
        match status {
            BookingStatus::Pending => Self::Blue,
            BookingStatus::Confirmed => Self::Green,
            BookingStatus::Completed => Self::Gray,
            BookingStatus::Cancelled => Self::Red,
        }
    }
}

/// What a calendar event represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Booking,
    ExternalBlock,
}

/// A materialized calendar event. Computed per request, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: NaiveDate,
    /// Exclusive.
    pub end: NaiveDate,
    pub color_key: ColorKey,
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<BookingId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    /// Channel label of an external block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl CalendarEvent {
    /// Creates the event for a booking.
    pub fn from_booking(booking: &BookingRecord) -> Self {
        Self {
            id: format!("booking-{}", booking.id),
            title: format!("{} - {}", booking.guest_name, booking.status),
            start: booking.check_in,
            end: booking.check_out,
            color_key: ColorKey::from(booking.status),
            kind: EventKind::Booking,
            booking_id: Some(booking.id),
            status: Some(booking.status),
            source: None,
        }
    }

    /// Creates the event for an external range.
    pub fn from_external(range: &DateRange) -> Self {
        let label = range.source().label().unwrap_or("External Calendar");
        Self {
            id: format!("external-{}-{}", range.start(), range.end()),
            title: format!("Blocked ({})", label),
            start: range.start(),
            end: range.end(),
            color_key: ColorKey::Orange,
            kind: EventKind::ExternalBlock,
            booking_id: None,
            status: None,
            source: Some(label.to_string()),
        }
    }

    pub fn is_booking(&self) -> bool {
        self.kind == EventKind::Booking
    }

    /// Returns `true` if this event shares a day with `[start, end)`.
    pub fn overlaps_span(&self, start: NaiveDate, end: NaiveDate) -> bool {
        spans_overlap(self.start, self.end, start, end)
    }
}

/// Per-kind event tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCounts {
    pub bookings: usize,
    pub external_blocked: usize,
    pub total: usize,
}

impl EventCounts {
    pub fn from_events(events: &[CalendarEvent]) -> Self {
        let bookings = events.iter().filter(|event| event.is_booking()).count();
        Self {
            bookings,
            external_blocked: events.len() - bookings,
            total: events.len(),
        }
    }
}

/// Keeps the bookings still relevant to a calendar view: those checking out
/// on or after `since`.
pub fn bookings_in_window(bookings: &[BookingRecord], since: NaiveDate) -> Vec<BookingRecord> {
    bookings
        .iter()
        .filter(|booking| booking.check_out >= since)
        .cloned()
        .collect()
}

/// Builds calendar events from bookings and external ranges.
///
/// Bookings of every status become events, coloured by status; bookings with
/// empty or inverted stays are skipped. An external range overlapping any
/// booking event is suppressed. External ranges are never compared with each
/// other, so overlapping blocks from two channels both appear.
pub fn materialize_events(
    bookings: &[BookingRecord],
    external_ranges: &[DateRange],
) -> Vec<CalendarEvent> {
    let mut events: Vec<CalendarEvent> = bookings
        .iter()
        .filter(|booking| booking.check_in < booking.check_out)
        .map(CalendarEvent::from_booking)
        .collect();
    let booking_events = events.len();

    for range in external_ranges {
        let echoed = events[..booking_events]
            .iter()
            .any(|event| event.overlaps_span(range.start(), range.end()));
        if echoed {
            trace!(
                start = %range.start(),
                end = %range.end(),
                "Suppressing external block overlapping a booking"
            );
            continue;
        }
        events.push(CalendarEvent::from_external(range));
    }

    events
}
