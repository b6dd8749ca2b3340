//! Availability aggregation.
//!
//! Merges ranges from external calendar feeds with the bookings held in the
//! application's store into:
//!
//! - a flat, deduplicated list of unavailable days for yes/no checks, and
//! - the original per-source range list, so a UI can explain why a day is
//!   blocked.
//!
//! Everything here is pure; invalid inputs are filtered, never reported.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::booking::{BookingId, BookingRecord};
use crate::range::{DateRange, spans_overlap};

/// Result of reconciling bookings with external ranges.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Unavailability {
    /// Every contributing range, not merged, internal ranges first.
    pub merged_ranges: Vec<DateRange>,
    /// Blocked days, ascending and without duplicates.
    pub unavailable_dates: Vec<NaiveDate>,
}

impl Unavailability {
    /// Returns `true` if the given day is blocked.
    pub fn is_unavailable(&self, date: NaiveDate) -> bool {
        self.unavailable_dates.binary_search(&date).is_ok()
    }

    /// Returns the ranges responsible for blocking the given day.
    pub fn blocking_ranges(&self, date: NaiveDate) -> Vec<&DateRange> {
        self.merged_ranges
            .iter()
            .filter(|range| range.contains(date))
            .collect()
    }

    /// Number of internal (booking-derived) ranges.
    pub fn internal_count(&self) -> usize {
        self.merged_ranges
            .iter()
            .filter(|range| range.source().is_internal())
            .count()
    }

    /// Number of external (feed-derived) ranges.
    pub fn external_count(&self) -> usize {
        self.merged_ranges.len() - self.internal_count()
    }
}

/// Computes the unavailable days for a property.
///
/// Only bookings whose status blocks availability contribute. A day covered
/// by several ranges, whatever their source, appears once in
/// `unavailable_dates`. Check-out days are never blocked.
pub fn compute_unavailability(
    external_ranges: &[DateRange],
    bookings: &[BookingRecord],
) -> Unavailability {
    let mut merged_ranges: Vec<DateRange> = bookings
        .iter()
        .filter(|booking| booking.blocks_availability())
        .filter_map(|booking| {
            let range = booking.to_range();
            if range.is_none() {
                debug!(
                    booking_id = booking.id,
                    check_in = %booking.check_in,
                    check_out = %booking.check_out,
                    "Discarding booking with empty or inverted stay"
                );
            }
            range
        })
        .collect();
    merged_ranges.extend(external_ranges.iter().cloned());

    let days: BTreeSet<NaiveDate> = merged_ranges.iter().flat_map(DateRange::days).collect();

    Unavailability {
        merged_ranges,
        unavailable_dates: days.into_iter().collect(),
    }
}

/// A continuous blocked period, with provenance dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockedPeriod {
    pub start: NaiveDate,
    /// Exclusive.
    pub end: NaiveDate,
}

/// Coalesces overlapping or back-to-back ranges into continuous periods,
/// sorted by start.
pub fn coalesce(ranges: &[DateRange]) -> Vec<BlockedPeriod> {
    let mut spans: Vec<(NaiveDate, NaiveDate)> =
        ranges.iter().map(|range| (range.start(), range.end())).collect();
    spans.sort();

    let mut periods: Vec<BlockedPeriod> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match periods.last_mut() {
            Some(last) if start <= last.end => {
                if end > last.end {
                    last.end = end;
                }
            }
            _ => periods.push(BlockedPeriod { start, end }),
        }
    }
    periods
}

/// A guest's request to stay from `check_in` to `check_out`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayRequest {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    /// Booking being edited, ignored when looking for conflicts.
    pub exclude_booking_id: Option<BookingId>,
}

impl StayRequest {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        Self {
            check_in,
            check_out,
            exclude_booking_id: None,
        }
    }

    /// Builder method to ignore an existing booking.
    pub fn excluding(mut self, booking_id: BookingId) -> Self {
        self.exclude_booking_id = Some(booking_id);
        self
    }

    /// Number of nights requested.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}

/// Verdict for a [`StayRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StayCheck {
    pub available: bool,
    pub reason: Option<String>,
    /// Blocking bookings that overlap the request.
    pub conflicting_bookings: Vec<BookingRecord>,
    /// External ranges that overlap the request.
    pub conflicting_blocks: Vec<DateRange>,
}

impl StayCheck {
    fn available() -> Self {
        Self {
            available: true,
            ..Default::default()
        }
    }

    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            available: false,
            reason: Some(reason.into()),
            ..Default::default()
        }
    }
}

/// Checks whether a stay can be booked.
///
/// Bookings are checked before external ranges so the reason names the
/// conflict the owner controls directly.
pub fn check_stay(
    request: &StayRequest,
    bookings: &[BookingRecord],
    external_ranges: &[DateRange],
    today: NaiveDate,
) -> StayCheck {
    if request.check_out <= request.check_in {
        return StayCheck::rejected("Check-out date must be after check-in date.");
    }
    if request.check_in < today {
        return StayCheck::rejected("Check-in date cannot be in the past.");
    }

    let conflicting_bookings: Vec<BookingRecord> = bookings
        .iter()
        .filter(|booking| booking.blocks_availability())
        .filter(|booking| Some(booking.id) != request.exclude_booking_id)
        .filter(|booking| booking.check_in < booking.check_out)
        .filter(|booking| booking.overlaps_span(request.check_in, request.check_out))
        .cloned()
        .collect();

    if !conflicting_bookings.is_empty() {
        let mut check = StayCheck::rejected(format!(
            "Property is not available for the selected dates. {} conflicting booking(s) found.",
            conflicting_bookings.len()
        ));
        check.conflicting_bookings = conflicting_bookings;
        return check;
    }

    let conflicting_blocks: Vec<DateRange> = external_ranges
        .iter()
        .filter(|range| {
            spans_overlap(
                range.start(),
                range.end(),
                request.check_in,
                request.check_out,
            )
        })
        .cloned()
        .collect();

    if !conflicting_blocks.is_empty() {
        let mut check = StayCheck::rejected(
            "Property is blocked on an external calendar. Please choose different dates.",
        );
        check.conflicting_blocks = conflicting_blocks;
        return check;
    }

    StayCheck::available()
}
