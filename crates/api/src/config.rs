use std::net::{AddrParseError, IpAddr};
use std::time::Duration;

use crate::auth::jwt::JwtConfig;

/// Deployment environment. Production hides validation details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "test" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// Log output format for the `fmt` layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Per-client rate limit applied to `/api/v1`.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests allowed per client within one window.
    pub max_requests: u32,
    pub window: Duration,
    /// Reverse proxies whose `x-forwarded-for` header is believed.
    pub trusted_proxies: Vec<IpAddr>,
}

/// Parse a comma-separated list of proxy addresses. Blank entries are skipped.
pub fn parse_trusted_proxies(raw: &str) -> Result<Vec<IpAddr>, AddrParseError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background tasks (default: `30`).
    pub shutdown_timeout_secs: u64,
    pub app_env: AppEnv,
    pub log_format: LogFormat,
    pub rate_limit: RateLimitConfig,
    /// JWT validation settings.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `HOST`                    | `0.0.0.0`               |
    /// | `PORT`                    | `3000`                  |
    /// | `CORS_ORIGINS`            | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`   | `30`                    |
    /// | `APP_ENV`                 | `development`           |
    /// | `LOG_FORMAT`              | `pretty`                |
    /// | `RATE_LIMIT_MAX_REQUESTS` | `120`                   |
    /// | `RATE_LIMIT_WINDOW_SECS`  | `60`                    |
    /// | `RATE_LIMIT_TRUSTED_PROXIES` | (none)               |
    ///
    /// # Panics
    ///
    /// Panics on any unparseable value so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let app_env_raw = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let app_env = AppEnv::parse(&app_env_raw)
            .unwrap_or_else(|| panic!("APP_ENV must be 'development' or 'production', got '{app_env_raw}'"));

        let log_format_raw = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".into());
        let log_format = LogFormat::parse(&log_format_raw)
            .unwrap_or_else(|| panic!("LOG_FORMAT must be 'pretty' or 'json', got '{log_format_raw}'"));

        let max_requests: u32 = std::env::var("RATE_LIMIT_MAX_REQUESTS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("RATE_LIMIT_MAX_REQUESTS must be a valid u32");
        assert!(max_requests > 0, "RATE_LIMIT_MAX_REQUESTS must be positive");

        let window_secs: u64 = std::env::var("RATE_LIMIT_WINDOW_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("RATE_LIMIT_WINDOW_SECS must be a valid u64");
        assert!(window_secs > 0, "RATE_LIMIT_WINDOW_SECS must be positive");

        let trusted_proxies_raw = std::env::var("RATE_LIMIT_TRUSTED_PROXIES").unwrap_or_default();
        let trusted_proxies = parse_trusted_proxies(&trusted_proxies_raw).unwrap_or_else(|e| {
            panic!("RATE_LIMIT_TRUSTED_PROXIES must list IP addresses, got '{trusted_proxies_raw}': {e}")
        });

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            app_env,
            log_format,
            rate_limit: RateLimitConfig {
                max_requests,
                window: Duration::from_secs(window_secs),
                trusted_proxies,
            },
            jwt,
        }
    }
}
