//! Fixtures shared by the server tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use staysync_core::{BookingRecord, BookingStatus, Property};
use staysync_feeds::{BoxFuture, FeedError, FeedErrorCode, FeedFetcher, FeedResult};

use crate::repository::InMemoryStore;

pub const SCENARIO_FEED: &str = "BEGIN:VCALENDAR\r\n\
    VERSION:2.0\r\n\
    BEGIN:VEVENT\r\n\
    UID:hm-1@airbnb.com\r\n\
    DTSTART;VALUE=DATE:20250720\r\n\
    DTEND;VALUE=DATE:20250722\r\n\
    SUMMARY:Reserved\r\n\
    END:VEVENT\r\n\
    BEGIN:VEVENT\r\n\
    UID:broken\r\n\
    DTSTART;VALUE=DATE:2025-07-25\r\n\
    END:VEVENT\r\n\
    END:VCALENDAR\r\n";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 1, 9, 30, 0).unwrap()
}

/// Property 1 has a feed and three bookings; property 2 has neither feed
/// nor bookings of interest.
pub fn fixture_store() -> InMemoryStore {
    InMemoryStore::new()
        .with_property(
            Property::new(1, "Seaside Cottage")
                .with_external_calendar("https://www.airbnb.com/calendar/ical/1.ics"),
        )
        .with_property(Property::new(2, "City Loft"))
        .with_booking(
            BookingRecord::new(
                10,
                1,
                date(2025, 7, 10),
                date(2025, 7, 13),
                BookingStatus::Confirmed,
            )
            .with_guest("Ada", "ada@example.com"),
        )
        .with_booking(
            BookingRecord::new(
                12,
                1,
                date(2025, 6, 1),
                date(2025, 6, 3),
                BookingStatus::Pending,
            )
            .with_guest("Bo", "bo@example.com"),
        )
        .with_booking(
            BookingRecord::new(
                13,
                1,
                date(2025, 4, 25),
                date(2025, 5, 1),
                BookingStatus::Completed,
            )
            .with_guest("Cy", "cy@example.com"),
        )
}

/// A fetcher returning a canned body or error and counting calls.
pub struct StubFetcher {
    response: Result<String, FeedErrorCode>,
    calls: Arc<AtomicUsize>,
}

impl StubFetcher {
    pub fn with_body(body: &str) -> Self {
        Self {
            response: Ok(body.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn scenario_feed() -> Self {
        Self::with_body(SCENARIO_FEED)
    }

    pub fn failing(code: FeedErrorCode) -> Self {
        Self {
            response: Err(code),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl FeedFetcher for StubFetcher {
    fn name(&self) -> &str {
        "stub"
    }

    fn fetch(&self, _url: &str) -> BoxFuture<'_, FeedResult<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self
            .response
            .clone()
            .map_err(|code| FeedError::new(code, "stubbed failure"));
        Box::pin(async move { result })
    }
}
