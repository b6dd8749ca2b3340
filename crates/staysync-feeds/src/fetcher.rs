//! Feed retrieval.
//!
//! [`FeedFetcher`] is the seam between the sync orchestrator and the
//! network. The production implementation is [`HttpFeedFetcher`]; tests
//! substitute stubs that return canned bodies or errors.

use std::future::Future;
use std::pin::Pin;

use reqwest::{Client, Response, StatusCode};
use tracing::{debug, trace, warn};
use url::Url;

use crate::config::FeedConfig;
use crate::error::{FeedError, FeedResult};

/// A boxed future for async trait methods, keeping the trait object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Retrieves the raw text of an external calendar feed.
///
/// One call is one outbound request. Implementations must not retry, and
/// dropping the returned future must abandon the request.
pub trait FeedFetcher: Send + Sync {
    /// Short name for logs (e.g. "http").
    fn name(&self) -> &str;

    /// Fetches the feed at `url`.
    fn fetch(&self, url: &str) -> BoxFuture<'_, FeedResult<String>>;
}

/// Fetches feeds over HTTP(S) with a bounded timeout.
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: Client,
    config: FeedConfig,
}

impl HttpFeedFetcher {
    pub fn new(config: FeedConfig) -> FeedResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                FeedError::configuration(format!("Failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    async fn get(&self, url: Url) -> FeedResult<String> {
        debug!(host = url.host_str().unwrap_or_default(), "Fetching external feed");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FeedError::timeout(format!(
                    "Feed did not respond within {}s",
                    self.config.timeout.as_secs()
                ))
                .with_source(e)
            } else {
                FeedError::network(format!("Request failed: {}", e)).with_source(e)
            }
        })?;

        self.handle_response(response).await
    }

    async fn handle_response(&self, response: Response) -> FeedResult<String> {
        let status = response.status();
        trace!(status = %status, "Received response");

        match status {
            StatusCode::OK => self.read_body(response).await,
            s if s.is_success() => {
                debug!(status = %s, "Non-200 success status, reading body anyway");
                self.read_body(response).await
            }
            s => {
                warn!(status = %s, "Feed request failed");
                Err(FeedError::http_status(
                    s.as_u16(),
                    format!("Feed request failed with status {}", s),
                ))
            }
        }
    }

    async fn read_body(&self, response: Response) -> FeedResult<String> {
        let limit = self.config.max_body_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(FeedError::invalid_response(format!(
                "Feed body exceeds {} bytes",
                limit
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FeedError::timeout("Timed out reading feed body").with_source(e)
            } else {
                FeedError::network(format!("Failed to read response: {}", e)).with_source(e)
            }
        })?;

        if bytes.len() > limit {
            return Err(FeedError::invalid_response(format!(
                "Feed body exceeds {} bytes",
                limit
            )));
        }

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl FeedFetcher for HttpFeedFetcher {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(&self, url: &str) -> BoxFuture<'_, FeedResult<String>> {
        let url = normalize_feed_url(url);
        Box::pin(async move { self.get(url?).await })
    }
}

/// Validates a feed URL, rewriting `webcal://` to `https://`.
pub fn normalize_feed_url(raw: &str) -> FeedResult<Url> {
    let trimmed = raw.trim();
    let rewritten = match trimmed.get(..9) {
        Some(prefix) if prefix.eq_ignore_ascii_case("webcal://") => {
            format!("https://{}", &trimmed[9..])
        }
        _ => trimmed.to_string(),
    };

    let url = Url::parse(&rewritten)
        .map_err(|e| FeedError::invalid_url(format!("Invalid feed URL: {}", e)).with_source(e))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FeedError::invalid_url(format!(
            "Unsupported feed URL scheme: {}",
            other
        ))),
    }
}
