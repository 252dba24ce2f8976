use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::analytics::AnalyticsPeriod;
use crate::search_console::MAX_ROW_LIMIT;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub google: GoogleConfig,
    pub session: SessionConfig,
    pub search_console: SearchConsoleConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    #[serde(default)]
    pub jwks_url: Option<String>,
    #[serde(default = "GoogleConfig::default_cache_ttl_secs")]
    pub jwks_cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Mark session cookies `Secure` (enable behind HTTPS)
    pub cookie_secure: bool,
    /// HMAC secret for OAuth state tokens
    /// If None, a random key is generated at startup
    pub state_secret: Option<String>,
    /// Where the OAuth callback sends the browser after login
    pub post_login_redirect: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConsoleConfig {
    pub api_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    pub default_period: AnalyticsPeriod,
    /// Rows requested per Search Console call (max 25000)
    pub row_limit: u32,
    /// Ceiling on rows accumulated by a paginated query
    pub max_rows: usize,
    /// Window used by the indexing estimate
    pub indexing_lookback_days: u32,
}

impl GoogleConfig {
    const fn default_cache_ttl_secs() -> u64 {
        3600
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let client_id =
            std::env::var("GOOGLE_CLIENT_ID").context("GOOGLE_CLIENT_ID must be set")?;
        let client_secret =
            std::env::var("GOOGLE_CLIENT_SECRET").context("GOOGLE_CLIENT_SECRET must be set")?;
        let redirect_uri =
            std::env::var("GOOGLE_REDIRECT_URI").context("GOOGLE_REDIRECT_URI must be set")?;
        let jwks_url = std::env::var("GOOGLE_JWKS_URL").ok();
        let jwks_cache_ttl_secs = std::env::var("GOOGLE_JWKS_CACHE_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(GoogleConfig::default_cache_ttl_secs);

        Ok(GoogleConfig {
            client_id,
            client_secret,
            redirect_uri,
            jwks_url,
            jwks_cache_ttl_secs,
        })
    }
}

impl SessionConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        let state_secret = std::env::var("OAUTH_STATE_SECRET")
            .ok()
            .filter(|s| !s.is_empty());
        let post_login_redirect = std::env::var("POST_LOGIN_REDIRECT")
            .unwrap_or_else(|_| "/app/dashboard".to_string());

        Ok(SessionConfig {
            cookie_secure,
            state_secret,
            post_login_redirect,
        })
    }
}

impl Default for SearchConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://searchconsole.googleapis.com/webmasters/v3".to_string(),
            timeout_secs: 30,
        }
    }
}

impl SearchConsoleConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let api_base_url = std::env::var("SEARCH_CONSOLE_API_BASE")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);
        let timeout_secs = match std::env::var("SEARCH_CONSOLE_TIMEOUT_SECS") {
            Ok(v) => v
                .parse::<u64>()
                .context("SEARCH_CONSOLE_TIMEOUT_SECS must be a number of seconds")?,
            Err(_) => defaults.timeout_secs,
        };

        Ok(SearchConsoleConfig {
            api_base_url,
            timeout_secs,
        })
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_period: AnalyticsPeriod::default(),
            row_limit: MAX_ROW_LIMIT,
            max_rows: 1000,
            indexing_lookback_days: 480,
        }
    }
}

impl AnalyticsConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let default_period = match std::env::var("ANALYTICS_DEFAULT_PERIOD") {
            Ok(v) => v.parse::<AnalyticsPeriod>().unwrap_or_else(|_| {
                tracing::warn!(
                    "Unknown ANALYTICS_DEFAULT_PERIOD '{v}', falling back to '{}'. Supported values: 7d, 28d, 3mo, 6mo, 12mo, 16mo",
                    defaults.default_period
                );
                defaults.default_period
            }),
            Err(_) => defaults.default_period,
        };

        let row_limit = match std::env::var("ANALYTICS_ROW_LIMIT") {
            Ok(v) => v
                .parse::<u32>()
                .context("ANALYTICS_ROW_LIMIT must be a positive integer")?
                .clamp(1, MAX_ROW_LIMIT),
            Err(_) => defaults.row_limit,
        };

        let max_rows = match std::env::var("ANALYTICS_MAX_ROWS") {
            Ok(v) => v
                .parse::<usize>()
                .context("ANALYTICS_MAX_ROWS must be a positive integer")?,
            Err(_) => defaults.max_rows,
        };

        let indexing_lookback_days = match std::env::var("INDEXING_LOOKBACK_DAYS") {
            Ok(v) => parse_lookback_days(&v)?,
            Err(_) => defaults.indexing_lookback_days,
        };

        Ok(AnalyticsConfig {
            default_period,
            row_limit,
            max_rows,
            indexing_lookback_days,
        })
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let api_port = std::env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        Ok(Config {
            server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            google: GoogleConfig::from_env()?,
            session: SessionConfig::from_env()?,
            search_console: SearchConsoleConfig::from_env()?,
            analytics: AnalyticsConfig::from_env()?,
        })
    }
}

/// Search Console keeps 16 months of data; older windows return nothing.
fn parse_lookback_days(value: &str) -> anyhow::Result<u32> {
    let days = value
        .trim()
        .parse::<u32>()
        .context("INDEXING_LOOKBACK_DAYS must be a number of days")?;
    let max = AnalyticsPeriod::Months16.days();
    if !(1..=max).contains(&days) {
        anyhow::bail!("INDEXING_LOOKBACK_DAYS must be between 1 and {max}, got {days}");
    }
    Ok(days)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}
