//! Error types for external feed operations.
//!
//! A failed feed is never fatal to availability consumers; these errors are
//! carried inside [`FeedOutcome`](crate::FeedOutcome) and reported to owners.

use std::fmt;
use thiserror::Error;

/// The category of a feed error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedErrorCode {
    /// Connection refused, DNS failure, TLS failure, body read failure.
    NetworkError,
    /// The fetch did not complete within the configured timeout.
    Timeout,
    /// The channel answered with a non-success HTTP status.
    HttpStatus,
    /// The body is not an iCalendar document (or is too large).
    InvalidResponse,
    /// The configured feed URL cannot be fetched.
    InvalidUrl,
    /// The fetcher itself could not be built.
    ConfigurationError,
}

impl FeedErrorCode {
    /// Returns true if a later manual resync may succeed without changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError | Self::Timeout | Self::HttpStatus)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkError => "network_error",
            Self::Timeout => "timeout",
            Self::HttpStatus => "http_status",
            Self::InvalidResponse => "invalid_response",
            Self::InvalidUrl => "invalid_url",
            Self::ConfigurationError => "configuration_error",
        }
    }
}

impl fmt::Display for FeedErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while fetching or reading an external feed.
#[derive(Debug, Error)]
pub struct FeedError {
    code: FeedErrorCode,
    message: String,
    /// Channel the feed belongs to (e.g. "Airbnb"), if known.
    channel: Option<String>,
    /// HTTP status for [`FeedErrorCode::HttpStatus`].
    status: Option<u16>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl FeedError {
    pub fn new(code: FeedErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            channel: None,
            status: None,
            source: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FeedErrorCode::NetworkError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FeedErrorCode::Timeout, message)
    }

    /// Creates an error for a non-success HTTP status.
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        let mut err = Self::new(FeedErrorCode::HttpStatus, message);
        err.status = Some(status);
        err
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(FeedErrorCode::InvalidResponse, message)
    }

    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::new(FeedErrorCode::InvalidUrl, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(FeedErrorCode::ConfigurationError, message)
    }

    /// Sets the channel this feed belongs to.
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Sets the source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> FeedErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref channel) = self.channel {
            write!(f, "[{}] ", channel)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;
