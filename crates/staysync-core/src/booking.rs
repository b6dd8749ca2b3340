//! Booking and property records read from the application's stores.
//!
//! These are owned by the booking workflow; this crate only reads them.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::range::{DateRange, spans_overlap};

/// Identifier of a listed property.
pub type PropertyId = i64;

/// Identifier of a booking.
pub type BookingId = i64;

/// Lifecycle status of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Awaiting payment or confirmation.
    Pending,
    /// Confirmed (stores that record a separate "paid" status map it here).
    #[serde(alias = "paid")]
    Confirmed,
    /// The stay has finished.
    Completed,
    /// Cancelled by guest or owner.
    Cancelled,
}

impl BookingStatus {
    /// Returns `true` if bookings with this status block guest-facing
    /// availability.
    ///
    /// Only confirmed bookings do: a pending hold must not lock other guests
    /// out, and completed or cancelled stays no longer occupy dates.
    pub fn blocks_availability(&self) -> bool {
        matches!(self, Self::Confirmed)
    }

    /// Returns the lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A booking as held in the booking store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub id: BookingId,
    pub property_id: PropertyId,
    /// Arrival day (first blocked night).
    pub check_in: NaiveDate,
    /// Departure day (not blocked).
    pub check_out: NaiveDate,
    pub status: BookingStatus,
    pub guest_name: String,
    pub guest_email: String,
}

impl BookingRecord {
    /// Creates a booking record with empty guest details.
    pub fn new(
        id: BookingId,
        property_id: PropertyId,
        check_in: NaiveDate,
        check_out: NaiveDate,
        status: BookingStatus,
    ) -> Self {
        Self {
            id,
            property_id,
            check_in,
            check_out,
            status,
            guest_name: String::new(),
            guest_email: String::new(),
        }
    }

    /// Builder method to set the guest's name and email.
    pub fn with_guest(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.guest_name = name.into();
        self.guest_email = email.into();
        self
    }

    /// Returns `true` if this booking blocks guest-facing availability.
    pub fn blocks_availability(&self) -> bool {
        self.status.blocks_availability()
    }

    /// Returns the stay as an internal [`DateRange`], or `None` if the
    /// recorded dates are zero-length or inverted.
    pub fn to_range(&self) -> Option<DateRange> {
        DateRange::internal(self.check_in, self.check_out)
    }

    /// Returns `true` if the stay shares a night with `[start, end)`.
    pub fn overlaps_span(&self, start: NaiveDate, end: NaiveDate) -> bool {
        spans_overlap(self.check_in, self.check_out, start, end)
    }
}

/// Minimal projection of a listed property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: PropertyId,
    pub title: String,
    /// iCalendar feed the owner syncs from another channel, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_calendar_url: Option<String>,
}

impl Property {
    /// Creates a property without an external feed.
    pub fn new(id: PropertyId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            external_calendar_url: None,
        }
    }

    /// Builder method to set the external calendar URL.
    pub fn with_external_calendar(mut self, url: impl Into<String>) -> Self {
        self.external_calendar_url = Some(url.into());
        self
    }

    /// Returns the configured feed URL, ignoring blank values.
    pub fn feed_url(&self) -> Option<&str> {
        self.external_calendar_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Returns `true` if the owner configured an external feed.
    pub fn has_external_feed(&self) -> bool {
        self.feed_url().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn only_confirmed_blocks() {
        assert!(BookingStatus::Confirmed.blocks_availability());
        assert!(!BookingStatus::Pending.blocks_availability());
        assert!(!BookingStatus::Completed.blocks_availability());
        assert!(!BookingStatus::Cancelled.blocks_availability());
    }

    #[test]
    fn paid_deserializes_as_confirmed() {
        let status: BookingStatus = serde_json::from_str("\"paid\"").unwrap();
        assert_eq!(status, BookingStatus::Confirmed);
        let status: BookingStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(status, BookingStatus::Pending);
    }

    #[test]
    fn booking_record_from_camel_case_json() {
        let json = r#"{
            "id": 7,
            "propertyId": 3,
            "checkIn": "2025-07-10",
            "checkOut": "2025-07-13",
            "status": "confirmed",
            "guestName": "Ada",
            "guestEmail": "ada@example.com"
        }"#;
        let booking: BookingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(booking.id, 7);
        assert_eq!(booking.property_id, 3);
        assert_eq!(booking.check_in, date(2025, 7, 10));
        assert_eq!(booking.guest_name, "Ada");
        assert!(booking.blocks_availability());
    }

    #[test]
    fn inverted_booking_has_no_range() {
        let booking = BookingRecord::new(
            1,
            1,
            date(2025, 6, 3),
            date(2025, 6, 1),
            BookingStatus::Confirmed,
        );
        assert!(booking.to_range().is_none());
    }

    #[test]
    fn booking_range_is_internal() {
        let booking = BookingRecord::new(
            1,
            1,
            date(2025, 6, 1),
            date(2025, 6, 3),
            BookingStatus::Confirmed,
        );
        let range = booking.to_range().unwrap();
        assert!(range.source().is_internal());
        assert_eq!(range.start(), date(2025, 6, 1));
        assert_eq!(range.end(), date(2025, 6, 3));
    }

    #[test]
    fn property_feed_url_ignores_blank() {
        let property = Property::new(1, "Cottage").with_external_calendar("   ");
        assert!(!property.has_external_feed());

        let property =
            Property::new(1, "Cottage").with_external_calendar("https://example.com/cal.ics");
        assert_eq!(property.feed_url(), Some("https://example.com/cal.ics"));
    }
}
