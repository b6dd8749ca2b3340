//! Date ranges and their provenance.
//!
//! This module provides [`DateRange`], the end-exclusive span of calendar days
//! that every other component works with, and [`RangeSource`], the explicit tag
//! recording whether a range came from an internal booking or an external
//! calendar feed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Where a blocked range came from.
///
/// The tag is attached when the range is created, so consumers never have to
/// guess provenance from optional display fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RangeSource {
    /// A booking held in the application's own store.
    Internal,
    /// An entry from a synced external calendar, labelled with its channel
    /// (e.g. "Airbnb").
    External {
        /// Channel name shown to owners.
        label: String,
    },
}

impl RangeSource {
    /// Creates an external source with the given channel label.
    pub fn external(label: impl Into<String>) -> Self {
        Self::External {
            label: label.into(),
        }
    }

    /// Returns `true` for ranges derived from internal bookings.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }

    /// Returns `true` for ranges derived from an external feed.
    pub fn is_external(&self) -> bool {
        matches!(self, Self::External { .. })
    }

    /// Returns the channel label for external sources.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Internal => None,
            Self::External { label } => Some(label),
        }
    }

    /// Returns the wire name of the source kind.
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External { .. } => "external",
        }
    }
}

/// Half-open overlap test for day spans: `[s1, e1)` and `[s2, e2)` overlap
/// iff `s1 < e2 && s2 < e1`.
///
/// Back-to-back spans (one ends the day the other starts) do not overlap.
pub fn spans_overlap(s1: NaiveDate, e1: NaiveDate, s2: NaiveDate, e2: NaiveDate) -> bool {
    s1 < e2 && s2 < e1
}

/// A span of calendar days `[start, end)`.
///
/// The end date is exclusive: a stay from the 1st to the 3rd occupies the
/// nights of the 1st and the 2nd, and the 3rd stays free for the next
/// check-in. A range always satisfies `start < end`; constructors return
/// `None` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    source: RangeSource,
}

impl DateRange {
    /// Creates a range, or `None` if it is zero-length or inverted.
    pub fn new(start: NaiveDate, end: NaiveDate, source: RangeSource) -> Option<Self> {
        if start >= end {
            return None;
        }
        Some(Self {
            start,
            end,
            summary: None,
            description: None,
            source,
        })
    }

    /// Creates an internal range.
    pub fn internal(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        Self::new(start, end, RangeSource::Internal)
    }

    /// Creates an external range labelled with its channel.
    pub fn external(start: NaiveDate, end: NaiveDate, label: impl Into<String>) -> Option<Self> {
        Self::new(start, end, RangeSource::external(label))
    }

    /// Builder method to set the summary (entry title).
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// First blocked day.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// First day after the span (not blocked).
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn source(&self) -> &RangeSource {
        &self.source
    }

    /// Number of nights (blocked days) in the span.
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Returns `true` if the given day is blocked by this range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Returns `true` if the two ranges share at least one day.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        spans_overlap(self.start, self.end, other.start, other.end)
    }

    /// Returns `true` if this range shares a day with `[start, end)`.
    pub fn overlaps_span(&self, start: NaiveDate, end: NaiveDate) -> bool {
        spans_overlap(self.start, self.end, start, end)
    }

    /// Iterates over every blocked day, `start` inclusive to `end` exclusive.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |day| *day < self.end)
    }
}
