//! Core types: date ranges, bookings, availability aggregation, calendar events

pub mod availability;
pub mod booking;
pub mod calendar;
pub mod range;
pub mod tracing;

pub use availability::{
    BlockedPeriod, StayCheck, StayRequest, Unavailability, check_stay, coalesce,
    compute_unavailability,
};
pub use booking::{BookingId, BookingRecord, BookingStatus, Property, PropertyId};
pub use calendar::{
    CalendarEvent, ColorKey, EventCounts, EventKind, bookings_in_window, materialize_events,
};
pub use range::{DateRange, RangeSource, spans_overlap};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
