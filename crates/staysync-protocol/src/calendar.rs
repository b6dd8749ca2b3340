//! Calendar view and sync endpoint shapes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use staysync_core::{CalendarEvent, DateRange, EventCounts, PropertyId};

/// A calendar event with concrete colours for calendar widgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventView {
    #[serde(flatten)]
    pub event: CalendarEvent,
    pub background_color: &'static str,
    pub border_color: &'static str,
    pub text_color: &'static str,
}

impl From<CalendarEvent> for CalendarEventView {
    fn from(event: CalendarEvent) -> Self {
        let key = event.color_key;
        Self {
            event,
            background_color: key.background(),
            border_color: key.border(),
            text_color: key.text(),
        }
    }
}

/// `GET /calendar/events/{propertyId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventsResponse {
    pub property_id: PropertyId,
    pub property_name: String,
    pub events: Vec<CalendarEventView>,
    pub event_counts: EventCounts,
}

impl CalendarEventsResponse {
    pub fn new(
        property_id: PropertyId,
        property_name: impl Into<String>,
        events: Vec<CalendarEvent>,
    ) -> Self {
        let event_counts = EventCounts::from_events(&events);
        Self {
            property_id,
            property_name: property_name.into(),
            events: events.into_iter().map(CalendarEventView::from).collect(),
            event_counts,
        }
    }
}

/// One externally blocked span in a sync report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedDate {
    pub start_date: NaiveDate,
    /// Exclusive.
    pub end_date: NaiveDate,
    /// Channel label.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl From<&DateRange> for BlockedDate {
    fn from(range: &DateRange) -> Self {
        Self {
            start_date: range.start(),
            end_date: range.end(),
            source: range
                .source()
                .label()
                .unwrap_or(range.source().kind_str())
                .to_string(),
            summary: range.summary().map(str::to_string),
        }
    }
}

/// `POST|GET /calendar/sync/{propertyId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub success: bool,
    pub property_id: PropertyId,
    pub events_found: usize,
    pub blocked_dates: Vec<BlockedDate>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub synced_at: DateTime<Utc>,
}

impl SyncResponse {
    /// The property has no external calendar; nothing to do.
    pub fn not_configured(property_id: PropertyId, synced_at: DateTime<Utc>) -> Self {
        Self {
            success: true,
            property_id,
            events_found: 0,
            blocked_dates: Vec::new(),
            message: "No external calendar configured for this property".to_string(),
            error: None,
            synced_at,
        }
    }

    pub fn synced(
        property_id: PropertyId,
        ranges: &[DateRange],
        synced_at: DateTime<Utc>,
    ) -> Self {
        Self {
            success: true,
            property_id,
            events_found: ranges.len(),
            blocked_dates: ranges.iter().map(BlockedDate::from).collect(),
            message: format!(
                "Successfully synced {} events from external calendar",
                ranges.len()
            ),
            error: None,
            synced_at,
        }
    }

    pub fn failed(
        property_id: PropertyId,
        error: impl Into<String>,
        synced_at: DateTime<Utc>,
    ) -> Self {
        Self {
            success: false,
            property_id,
            events_found: 0,
            blocked_dates: Vec::new(),
            message: "External calendar sync failed".to_string(),
            error: Some(error.into()),
            synced_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use staysync_core::{BookingRecord, BookingStatus, materialize_events};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn calendar_events_wire_shape() {
        let bookings = vec![
            BookingRecord::new(
                11,
                7,
                date(2025, 6, 1),
                date(2025, 6, 3),
                BookingStatus::Pending,
            )
            .with_guest("Ada", "ada@example.com"),
        ];
        let external = vec![
            DateRange::external(date(2025, 6, 1), date(2025, 6, 3), "Airbnb").unwrap(),
            DateRange::external(date(2025, 6, 10), date(2025, 6, 12), "VRBO").unwrap(),
        ];
        let events = materialize_events(&bookings, &external);
        let response = CalendarEventsResponse::new(7, "Seaside Cottage", events);

        insta::assert_json_snapshot!(response, @r##"
        {
          "propertyId": 7,
          "propertyName": "Seaside Cottage",
          "events": [
            {
              "id": "booking-11",
              "title": "Ada - pending",
              "start": "2025-06-01",
              "end": "2025-06-03",
              "colorKey": "blue",
              "kind": "booking",
              "bookingId": 11,
              "status": "pending",
              "backgroundColor": "#3b82f6",
              "borderColor": "#2563eb",
              "textColor": "#ffffff"
            },
            {
              "id": "external-2025-06-10-2025-06-12",
              "title": "Blocked (VRBO)",
              "start": "2025-06-10",
              "end": "2025-06-12",
              "colorKey": "orange",
              "kind": "external_block",
              "source": "VRBO",
              "backgroundColor": "#f59e0b",
              "borderColor": "#d97706",
              "textColor": "#ffffff"
            }
          ],
          "eventCounts": {
            "bookings": 1,
            "externalBlocked": 1,
            "total": 2
          }
        }
        "##);
    }

    #[test]
    fn sync_report_shapes() {
        let ranges = vec![
            DateRange::external(date(2025, 7, 20), date(2025, 7, 22), "Airbnb")
                .unwrap()
                .with_summary("Reserved"),
        ];
        let response = SyncResponse::synced(7, &ranges, fixed_now());

        insta::assert_json_snapshot!(response, @r#"
        {
          "success": true,
          "propertyId": 7,
          "eventsFound": 1,
          "blockedDates": [
            {
              "startDate": "2025-07-20",
              "endDate": "2025-07-22",
              "source": "Airbnb",
              "summary": "Reserved"
            }
          ],
          "message": "Successfully synced 1 events from external calendar",
          "syncedAt": "2025-07-01T12:00:00Z"
        }
        "#);

        let none = SyncResponse::not_configured(7, fixed_now());
        assert!(none.success);
        assert_eq!(none.events_found, 0);

        let failed = SyncResponse::failed(7, "network_error: Request failed", fixed_now());
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("network_error: Request failed"));
    }
}
