use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Socket address the HTTP server binds to.
    #[serde(default = "Config::default_bind_addr")]
    pub bind_addr: String,
    /// Directory holding stops.txt and routes.txt.
    #[serde(default = "Config::default_data_dir")]
    pub data_dir: String,
    /// API key sent as `x-api-key` to the feed endpoints. Falls back to the
    /// MTA_API_KEY environment variable when unset.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Allowed CORS origins. Required unless cors_permissive is true.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Explicitly allow all origins (development only). Defaults to false.
    #[serde(default)]
    pub cors_permissive: bool,
    /// Feed fetch and cache configuration
    #[serde(default)]
    pub feeds: FeedConfig,
}

/// Configuration for real-time feed access and the two cache domains.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// TTL in seconds for cached normalized feeds (default: 15)
    #[serde(default = "FeedConfig::default_feed_ttl_secs")]
    pub feed_ttl_secs: u64,
    /// TTL in seconds for cached arrival boards (default: 1200)
    /// Boards keep absolute instants only, so a long TTL is safe; the human
    /// labels are recomputed on every read.
    #[serde(default = "FeedConfig::default_board_ttl_secs")]
    pub board_ttl_secs: u64,
    /// Timeout in seconds for a single feed request (default: 15)
    #[serde(default = "FeedConfig::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// IANA timezone for localized clock strings (default: America/New_York)
    #[serde(default = "FeedConfig::default_timezone")]
    pub timezone: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            feed_ttl_secs: Self::default_feed_ttl_secs(),
            board_ttl_secs: Self::default_board_ttl_secs(),
            request_timeout_secs: Self::default_request_timeout_secs(),
            timezone: Self::default_timezone(),
        }
    }
}

impl FeedConfig {
    fn default_feed_ttl_secs() -> u64 {
        15
    }
    fn default_board_ttl_secs() -> u64 {
        20 * 60
    }
    fn default_request_timeout_secs() -> u64 {
        15
    }
    fn default_timezone() -> String {
        "America/New_York".to_string()
    }

    /// Parse the configured timezone, falling back to New York.
    pub fn parsed_timezone(&self) -> chrono_tz::Tz {
        match self.timezone.parse() {
            Ok(tz) => tz,
            Err(_) => {
                tracing::warn!(
                    timezone = %self.timezone,
                    "Unknown timezone, falling back to America/New_York"
                );
                chrono_tz::America::New_York
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: Self::default_bind_addr(),
            data_dir: Self::default_data_dir(),
            api_key: None,
            cors_origins: Vec::new(),
            cors_permissive: false,
            feeds: FeedConfig::default(),
        }
    }
}

impl Config {
    fn default_bind_addr() -> String {
        "0.0.0.0:3000".to_string()
    }
    fn default_data_dir() -> String {
        "data".to_string()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// The configured key, else the MTA_API_KEY environment variable.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("MTA_API_KEY").ok())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
}
