//! Server configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/staysync/config.toml` by default. Every section is optional.
//!
//! ```toml
//! [http]
//! bind = "0.0.0.0:8080"
//!
//! [feeds]
//! timeout_secs = 15
//! max_entry_nights = 400
//!
//! [data]
//! seed = "/var/lib/staysync/seed.json"
//!
//! [[access.tokens]]
//! token = "owner-secret"
//! caller = "owner@example.com"
//! role = "owner"
//! properties = [1, 2]
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use staysync_feeds::{DEFAULT_MAX_ENTRY_NIGHTS, FeedConfig};

use crate::access::AccessToken;
use crate::error::{ServerError, ServerResult};

/// Upper bound accepted for `feeds.timeout_secs`.
pub const MAX_FEED_TIMEOUT_SECS: u64 = 120;

/// Configuration for the staysync server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http: HttpSettings,
    pub feeds: FeedSettings,
    pub calendar: CalendarSettings,
    pub data: DataSettings,
    pub access: AccessSettings,
}

/// Listener and HTTP caching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Address to listen on.
    pub bind: String,

    /// Allow cross-origin requests from booking widgets.
    pub cors: bool,

    /// `s-maxage` of availability responses, in seconds.
    pub cache_max_age: u64,

    /// `stale-while-revalidate` of availability responses, in seconds.
    pub stale_while_revalidate: u64,

    /// `s-maxage` of availability responses served while the feed fails.
    pub degraded_max_age: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            cors: true,
            cache_max_age: 3600,
            stale_while_revalidate: 86400,
            degraded_max_age: 60,
        }
    }
}

/// External feed fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// Fetch timeout in seconds (1 to 120).
    pub timeout_secs: u64,

    /// User agent override.
    pub user_agent: Option<String>,

    /// Feed entries spanning more nights than this are skipped.
    pub max_entry_nights: u32,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            timeout_secs: FeedConfig::DEFAULT_TIMEOUT_SECS,
            user_agent: None,
            max_entry_nights: DEFAULT_MAX_ENTRY_NIGHTS,
        }
    }
}

/// Calendar view settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Bookings that checked out more than this many days ago are hidden.
    pub lookback_days: u32,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self { lookback_days: 30 }
    }
}

/// Data source settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// JSON seed file for the in-memory store.
    pub seed: Option<PathBuf>,
}

/// Bearer tokens allowed to trigger a sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessSettings {
    pub tokens: Vec<AccessToken>,
}

impl ServerConfig {
    /// Loads configuration from the default path, or defaults if absent.
    pub fn load() -> ServerResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ServerError::config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("staysync")
    }

    /// Checks values that deserialize fine but cannot be used.
    pub fn validate(&self) -> ServerResult<()> {
        self.bind_addr()?;

        if self.feeds.timeout_secs == 0 || self.feeds.timeout_secs > MAX_FEED_TIMEOUT_SECS {
            return Err(ServerError::config(format!(
                "feeds.timeout_secs must be between 1 and {}, got {}",
                MAX_FEED_TIMEOUT_SECS, self.feeds.timeout_secs
            )));
        }

        if self.feeds.max_entry_nights == 0 {
            return Err(ServerError::config("feeds.max_entry_nights must be at least 1"));
        }

        if let Some(entry) = self.access.tokens.iter().find(|t| t.token.trim().is_empty()) {
            return Err(ServerError::config(format!(
                "access token for {} is empty",
                entry.caller
            )));
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> ServerResult<SocketAddr> {
        self.http.bind.parse().map_err(|e| {
            ServerError::config(format!("invalid http.bind {:?}: {}", self.http.bind, e))
        })
    }

    /// Builds the fetcher configuration.
    pub fn feed_config(&self) -> FeedConfig {
        let mut config =
            FeedConfig::new().with_timeout(Duration::from_secs(self.feeds.timeout_secs));
        if let Some(ref agent) = self.feeds.user_agent {
            config = config.with_user_agent(agent);
        }
        config
    }

    /// `Cache-Control` value for availability responses.
    pub fn cache_control(&self) -> String {
        format!(
            "public, s-maxage={}, stale-while-revalidate={}",
            self.http.cache_max_age, self.http.stale_while_revalidate
        )
    }

    /// `Cache-Control` value for availability computed without the feed.
    pub fn degraded_cache_control(&self) -> String {
        format!("public, max-age=0, s-maxage={}", self.http.degraded_max_age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Role;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.http.bind, "127.0.0.1:8080");
        assert_eq!(config.feeds.timeout_secs, 20);
        assert_eq!(config.feeds.max_entry_nights, 731);
        assert_eq!(config.calendar.lookback_days, 30);
        assert!(config.access.tokens.is_empty());
        assert_eq!(
            config.cache_control(),
            "public, s-maxage=3600, stale-while-revalidate=86400"
        );
        assert_eq!(config.degraded_cache_control(), "public, max-age=0, s-maxage=60");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[feeds]
timeout_secs = 5
max_entry_nights = 90

[[access.tokens]]
token = "s3cret"
caller = "owner@example.com"
role = "owner"
properties = [1, 2]

[[access.tokens]]
token = "root"
caller = "ops"
role = "admin"
"#
        )
        .unwrap();

        let config = ServerConfig::load_from(file.path()).unwrap();
        assert_eq!(config.feeds.timeout_secs, 5);
        assert_eq!(config.feeds.max_entry_nights, 90);
        assert_eq!(config.http.cache_max_age, 3600);
        assert_eq!(config.access.tokens.len(), 2);
        assert_eq!(config.access.tokens[0].role, Role::Owner);
        assert_eq!(config.access.tokens[0].properties, vec![1, 2]);
        assert!(config.access.tokens[1].properties.is_empty());
        assert_eq!(config.feed_config().timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[feeds\ntimeout_secs = ").unwrap();
        let err = ServerConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ServerError::Config { .. }));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = ServerConfig::default();
        config.feeds.timeout_secs = 0;
        assert!(config.validate().is_err());

        config.feeds.timeout_secs = 121;
        assert!(config.validate().is_err());

        config.feeds.timeout_secs = 120;
        assert!(config.validate().is_ok());

        config.feeds.max_entry_nights = 0;
        assert!(config.validate().is_err());
        config.feeds.max_entry_nights = 1;

        config.http.bind = "localhost-ish".to_string();
        assert!(config.validate().is_err());
    }
}
