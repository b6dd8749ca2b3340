//! Tracing setup for the staysync binary.
//!
//! Two presets: compact lines for local debugging and JSON lines for a
//! deployed server. `RUST_LOG` always wins over the preset level.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing_subscriber::util::TryInitError),

    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// How log records are written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingOutputFormat {
    Compact,
    /// One JSON object per line, for log shippers.
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Level for staysync and HTTP middleware targets when RUST_LOG is unset.
    pub level: Level,
    pub format: TracingOutputFormat,
    /// Log request span open/close from the HTTP layer.
    pub span_events: bool,
}

impl TracingConfig {
    /// Debug level, compact lines with file and line numbers.
    pub fn cli_debug() -> Self {
        Self {
            level: Level::DEBUG,
            format: TracingOutputFormat::Compact,
            span_events: false,
        }
    }

    /// Info level JSON with request spans.
    pub fn daemon() -> Self {
        Self {
            level: Level::INFO,
            format: TracingOutputFormat::Json,
            span_events: true,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Filter directive used when RUST_LOG is unset.
    pub fn default_directive(&self) -> String {
        format!("staysync={level},tower_http={level}", level = self.level)
    }

    fn env_filter(&self) -> Result<EnvFilter, TracingError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => Ok(EnvFilter::try_new(self.default_directive())?),
        }
    }
}

/// Installs the global subscriber. Call once at startup.
///
/// # Errors
///
/// Fails if a subscriber is already installed or the filter does not parse.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    // Exactly one of the two layers is present.
    let (compact, json) = match config.format {
        TracingOutputFormat::Compact => (
            Some(
                fmt::layer()
                    .compact()
                    .with_file(true)
                    .with_line_number(true)
                    .with_span_events(span_events)
                    .with_writer(std::io::stderr),
            ),
            None,
        ),
        TracingOutputFormat::Json => (
            None,
            Some(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_events(span_events)
                    .with_writer(std::io::stderr),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(compact)
        .with(json)
        .try_init()?;
    Ok(())
}
