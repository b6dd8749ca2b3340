//! Sync orchestrator.
//!
//! Wires the repositories, the feed fetcher and the pure core functions
//! together for the three consumer shapes (availability, calendar view,
//! sync report) plus the stay check. Each call pulls fresh data; nothing is
//! cached here.
//!
//! A failing feed never fails a request: availability and calendar views
//! fall back to bookings alone and carry the feed error as an advisory.

use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use staysync_core::{
    BookingRecord, Property, PropertyId, StayRequest, bookings_in_window, check_stay,
    compute_unavailability, materialize_events,
};
use staysync_feeds::{DEFAULT_MAX_ENTRY_NIGHTS, FeedFetcher, FeedOutcome, fetch_outcome};
use staysync_protocol::{
    AvailabilityResponse, CalendarEventsResponse, StayCheckResponse, SyncResponse,
};
use tracing::{debug, error, info, warn};

use crate::error::{ServerError, ServerResult};
use crate::repository::{BookingRepository, PropertyRepository};

/// Default calendar lookback in days.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

/// A property together with the outcome of consulting its feed.
#[derive(Debug)]
pub struct PropertyFeed {
    pub property: Property,
    pub outcome: FeedOutcome,
}

/// Serves availability, calendar and sync requests.
pub struct SyncService {
    properties: Arc<dyn PropertyRepository>,
    bookings: Arc<dyn BookingRepository>,
    fetcher: Arc<dyn FeedFetcher>,
    lookback_days: u32,
    max_entry_nights: u32,
}

impl SyncService {
    pub fn new(
        properties: Arc<dyn PropertyRepository>,
        bookings: Arc<dyn BookingRepository>,
        fetcher: Arc<dyn FeedFetcher>,
    ) -> Self {
        Self {
            properties,
            bookings,
            fetcher,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            max_entry_nights: DEFAULT_MAX_ENTRY_NIGHTS,
        }
    }

    /// Builder: how far back the calendar view shows past bookings.
    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    /// Builder: feed entries longer than this many nights are skipped.
    pub fn with_max_entry_nights(mut self, nights: u32) -> Self {
        self.max_entry_nights = nights;
        self
    }

    /// Fetches and parses the property's external feed.
    ///
    /// Only a missing property or a store failure is an error; feed
    /// problems are reported inside the returned outcome.
    pub async fn sync_property_feed(&self, property_id: PropertyId) -> ServerResult<PropertyFeed> {
        let property = self.lookup_property(property_id).await?;
        let outcome = self.consult_feed(&property).await;
        Ok(PropertyFeed { property, outcome })
    }

    /// Sync report for `POST|GET /calendar/sync/{id}`.
    pub async fn sync_report(
        &self,
        property_id: PropertyId,
        now: DateTime<Utc>,
    ) -> ServerResult<SyncResponse> {
        let feed = self.sync_property_feed(property_id).await?;
        let report = match feed.outcome {
            FeedOutcome::NotConfigured => SyncResponse::not_configured(property_id, now),
            FeedOutcome::Synced(synced) => {
                info!(
                    property_id,
                    events = synced.ranges.len(),
                    skipped = synced.skipped,
                    "External calendar synced"
                );
                SyncResponse::synced(property_id, &synced.ranges, now)
            }
            FeedOutcome::Failed(err) => SyncResponse::failed(property_id, err.to_string(), now),
        };
        Ok(report)
    }

    /// Guest-facing availability.
    pub async fn availability(
        &self,
        property_id: PropertyId,
        now: DateTime<Utc>,
    ) -> ServerResult<AvailabilityResponse> {
        let property = self.lookup_property(property_id).await?;
        let (bookings, outcome) = tokio::join!(
            self.list_bookings(property_id),
            self.consult_feed(&property)
        );
        let bookings = bookings?;

        let result = compute_unavailability(outcome.ranges(), &bookings);
        debug!(
            property_id,
            internal = result.internal_count(),
            external = result.external_count(),
            days = result.unavailable_dates.len(),
            "Computed availability"
        );

        let response =
            AvailabilityResponse::new(property_id, &result, property.has_external_feed(), now);
        Ok(match outcome.error() {
            Some(err) => response.with_feed_error(err.to_string()),
            None => response,
        })
    }

    /// Owner/admin calendar view.
    pub async fn calendar_events(
        &self,
        property_id: PropertyId,
        today: NaiveDate,
    ) -> ServerResult<CalendarEventsResponse> {
        let property = self.lookup_property(property_id).await?;
        let (bookings, outcome) = tokio::join!(
            self.list_bookings(property_id),
            self.consult_feed(&property)
        );
        let bookings = bookings?;

        let since = today
            .checked_sub_days(Days::new(u64::from(self.lookback_days)))
            .unwrap_or(NaiveDate::MIN);
        let in_window = bookings_in_window(&bookings, since);
        let events = materialize_events(&in_window, outcome.ranges());

        Ok(CalendarEventsResponse::new(
            property_id,
            property.title,
            events,
        ))
    }

    /// Answers whether `request` can be booked.
    pub async fn check_stay(
        &self,
        property_id: PropertyId,
        request: StayRequest,
        today: NaiveDate,
    ) -> ServerResult<StayCheckResponse> {
        let property = self.lookup_property(property_id).await?;
        let (bookings, outcome) = tokio::join!(
            self.list_bookings(property_id),
            self.consult_feed(&property)
        );
        let bookings = bookings?;

        let check = check_stay(&request, &bookings, outcome.ranges(), today);
        let response = StayCheckResponse::new(property_id, &request, check);
        Ok(match outcome.error() {
            Some(err) => response.with_feed_error(err.to_string()),
            None => response,
        })
    }

    async fn lookup_property(&self, property_id: PropertyId) -> ServerResult<Property> {
        match self.properties.get_property(property_id).await {
            Ok(Some(property)) => Ok(property),
            Ok(None) => {
                debug!(property_id, stage = "lookup_property", "Property not found");
                Err(ServerError::PropertyNotFound(property_id))
            }
            Err(e) => {
                error!(property_id, stage = "lookup_property", error = %e, "Property lookup failed");
                Err(ServerError::repository("lookup_property", e))
            }
        }
    }

    async fn list_bookings(&self, property_id: PropertyId) -> ServerResult<Vec<BookingRecord>> {
        self.bookings
            .list_bookings_for_property(property_id)
            .await
            .map_err(|e| {
                error!(property_id, stage = "list_bookings", error = %e, "Booking lookup failed");
                ServerError::repository("list_bookings", e)
            })
    }

    async fn consult_feed(&self, property: &Property) -> FeedOutcome {
        let outcome = fetch_outcome(
            self.fetcher.as_ref(),
            property.feed_url(),
            self.max_entry_nights,
        )
        .await;
        if let Some(err) = outcome.error() {
            warn!(
                property_id = property.id,
                code = %err.code(),
                retryable = err.is_retryable(),
                "Falling back to bookings only"
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubFetcher, date, fixed_now, fixture_store};
    use staysync_feeds::FeedErrorCode;

    fn service(fetcher: StubFetcher) -> SyncService {
        let store = Arc::new(fixture_store());
        SyncService::new(store.clone(), store, Arc::new(fetcher))
    }

    #[tokio::test]
    async fn scenario_bookings_and_feed() {
        let svc = service(StubFetcher::scenario_feed());
        let response = svc.availability(1, fixed_now()).await.unwrap();

        assert_eq!(
            response.unavailable_dates,
            vec![
                date(2025, 7, 10),
                date(2025, 7, 11),
                date(2025, 7, 12),
                date(2025, 7, 20),
                date(2025, 7, 21),
            ]
        );
        assert_eq!(response.booked_ranges.len(), 2);
        assert!(response.has_external_feed);
        assert!(response.feed_error.is_none());
    }

    #[tokio::test]
    async fn unreachable_feed_falls_back_to_bookings() {
        let fetcher = StubFetcher::failing(FeedErrorCode::NetworkError);
        let svc = service(fetcher);

        let availability = svc.availability(1, fixed_now()).await.unwrap();
        assert_eq!(availability.unavailable_dates.len(), 3);
        assert!(availability.feed_error.is_some());

        let report = svc.sync_report(1, fixed_now()).await.unwrap();
        assert!(!report.success);
        assert!(report.error.unwrap().contains("network_error"));
    }

    #[tokio::test]
    async fn no_feed_means_no_fetch() {
        let fetcher = StubFetcher::scenario_feed();
        let calls = fetcher.calls();
        let svc = service(fetcher);

        let report = svc.sync_report(2, fixed_now()).await.unwrap();
        assert!(report.success);
        assert_eq!(report.events_found, 0);

        let availability = svc.availability(2, fixed_now()).await.unwrap();
        assert!(!availability.has_external_feed);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn one_fetch_per_request() {
        let fetcher = StubFetcher::scenario_feed();
        let calls = fetcher.calls();
        let svc = service(fetcher);

        svc.sync_report(1, fixed_now()).await.unwrap();
        svc.availability(1, fixed_now()).await.unwrap();
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn runaway_feed_entries_stay_bounded() {
        let mut feed = String::from("BEGIN:VCALENDAR\r\n");
        for i in 0..20 {
            feed.push_str(&format!(
                "BEGIN:VEVENT\r\nUID:{i}@airbnb.com\r\n\
                 DTSTART;VALUE=DATE:10000101\r\nDTEND;VALUE=DATE:99991231\r\nEND:VEVENT\r\n"
            ));
        }
        feed.push_str(
            "BEGIN:VEVENT\r\nUID:ok@airbnb.com\r\n\
             DTSTART;VALUE=DATE:20250720\r\nDTEND;VALUE=DATE:20250722\r\nEND:VEVENT\r\n\
             END:VCALENDAR\r\n",
        );
        let svc = service(StubFetcher::with_body(&feed)).with_max_entry_nights(365);

        let response = svc.availability(1, fixed_now()).await.unwrap();
        assert_eq!(response.unavailable_dates.len(), 5);
        assert_eq!(response.booked_ranges.len(), 2);

        let report = svc.sync_report(1, fixed_now()).await.unwrap();
        assert!(report.success);
        assert_eq!(report.events_found, 1);
    }

    #[tokio::test]
    async fn unknown_property() {
        let svc = service(StubFetcher::scenario_feed());
        assert!(matches!(
            svc.availability(404, fixed_now()).await,
            Err(ServerError::PropertyNotFound(404))
        ));
        assert!(matches!(
            svc.sync_property_feed(404).await,
            Err(ServerError::PropertyNotFound(404))
        ));
    }

    #[tokio::test]
    async fn calendar_window_hides_old_bookings() {
        let svc = service(StubFetcher::scenario_feed()).with_lookback_days(30);

        // Booking 13 checked out 2025-05-01, more than 30 days before today.
        let response = svc.calendar_events(1, date(2025, 7, 1)).await.unwrap();
        let ids: Vec<&str> = response.events.iter().map(|e| e.event.id.as_str()).collect();
        assert!(!ids.contains(&"booking-13"));
        assert!(ids.contains(&"booking-10"));
        assert!(ids.contains(&"booking-12"));
        assert_eq!(response.property_name, "Seaside Cottage");
    }

    #[tokio::test]
    async fn stay_check_uses_feed() {
        let svc = service(StubFetcher::scenario_feed());

        let blocked = StayRequest::new(date(2025, 7, 19), date(2025, 7, 21));
        let response = svc.check_stay(1, blocked, date(2025, 7, 1)).await.unwrap();
        assert!(!response.available);
        assert_eq!(response.conflicting_blocks.len(), 1);

        let free = StayRequest::new(date(2025, 7, 13), date(2025, 7, 20));
        let response = svc.check_stay(1, free, date(2025, 7, 1)).await.unwrap();
        assert!(response.available);
    }
}
