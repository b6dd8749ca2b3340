//! HTTP handlers and router.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use staysync_core::{PropertyId, StayRequest};
use staysync_protocol::{HealthResponse, StayCheckQuery};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::access::AccessPolicy;
use crate::error::{ServerError, ServerResult};
use crate::sync::SyncService;

/// Source of the current time. A plain function so tests can pin it.
pub type Clock = fn() -> DateTime<Utc>;

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub sync: Arc<SyncService>,
    pub access: Arc<AccessPolicy>,
    /// `Cache-Control` of availability responses.
    pub cache_control: HeaderValue,
    /// `Cache-Control` of availability responses computed without the feed.
    pub degraded_cache_control: HeaderValue,
    pub clock: Clock,
}

/// Shared caches may hold a booking-only view for this long.
pub const DEFAULT_DEGRADED_CACHE_CONTROL: &str = "public, max-age=0, s-maxage=60";

fn header_value(value: &str) -> ServerResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| ServerError::config(format!("invalid Cache-Control value: {}", e)))
}

impl AppState {
    pub fn new(sync: SyncService, access: AccessPolicy, cache_control: &str) -> ServerResult<Self> {
        Ok(Self {
            sync: Arc::new(sync),
            access: Arc::new(access),
            cache_control: header_value(cache_control)?,
            degraded_cache_control: HeaderValue::from_static(DEFAULT_DEGRADED_CACHE_CONTROL),
            clock: Utc::now,
        })
    }

    /// Builder: `Cache-Control` used while the feed is failing.
    pub fn with_degraded_cache_control(mut self, cache_control: &str) -> ServerResult<Self> {
        self.degraded_cache_control = header_value(cache_control)?;
        Ok(self)
    }

    /// Builder: replace the clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

/// Builds the application router.
pub fn router(state: AppState, cors: bool) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/properties/{id}/availability", get(availability))
        .route("/properties/{id}/availability/check", get(availability_check))
        .route("/calendar/events/{id}", get(calendar_events))
        .route("/calendar/sync/{id}", get(sync_status).post(sync_trigger))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors {
        router.layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_origin(Any),
        )
    } else {
        router
    }
}

fn parse_property_id(raw: &str) -> ServerResult<PropertyId> {
    raw.trim()
        .parse::<PropertyId>()
        .map_err(|_| ServerError::InvalidRequest("Invalid property ID".to_string()))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

async fn availability(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Response> {
    let property_id = parse_property_id(&id)?;
    let response = state.sync.availability(property_id, (state.clock)()).await?;

    // A booking-only view must not outlive the feed outage in shared caches.
    let cache_control = if response.feed_error.is_some() {
        state.degraded_cache_control.clone()
    } else {
        state.cache_control.clone()
    };
    Ok(([(header::CACHE_CONTROL, cache_control)], Json(response)).into_response())
}

async fn availability_check(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<StayCheckQuery>, QueryRejection>,
) -> ServerResult<Response> {
    let property_id = parse_property_id(&id)?;
    let Query(query) = query.map_err(|e| ServerError::InvalidRequest(e.body_text()))?;

    let today = (state.clock)().date_naive();
    let response = state
        .sync
        .check_stay(property_id, StayRequest::from(query), today)
        .await?;
    Ok(Json(response).into_response())
}

async fn calendar_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Response> {
    let property_id = parse_property_id(&id)?;
    let today = (state.clock)().date_naive();
    let response = state.sync.calendar_events(property_id, today).await?;
    Ok(Json(response).into_response())
}

/// Read-only sync status. Always 200 once the property exists.
async fn sync_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Response> {
    let property_id = parse_property_id(&id)?;
    let report = state.sync.sync_report(property_id, (state.clock)()).await?;
    Ok(Json(report).into_response())
}

/// Manual sync by an owner or admin. A failed feed answers 502.
async fn sync_trigger(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ServerResult<Response> {
    let property_id = parse_property_id(&id)?;
    let caller = state.access.authorize(&headers, property_id)?;
    info!(caller = %caller.id, property_id, "Manual sync requested");
    let report = state.sync.sync_report(property_id, (state.clock)()).await?;
    let status = if report.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    Ok((status, Json(report)).into_response())
}
