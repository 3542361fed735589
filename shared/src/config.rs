use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_prefix: String,
    pub brand_id: String,
    pub host: String,
    pub http_port: u16,
    pub refresh_interval: Duration,
    pub http_timeout: Duration,
    pub max_brands: Option<u64>,
    pub handoff_path: Option<String>,
    pub allowed_origins: Vec<String>,
}

impl Config {
    const DEFAULT_API_URL: &str = "http://localhost:3000/api/";
    const DEFAULT_API_PREFIX: &str = "eprovet/";
    const DEFAULT_BRAND_ID: &str = "default";
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_HTTP_PORT: u16 = 8080;
    const DEFAULT_REFRESH_INTERVAL_MS: u64 = 5 * 60 * 1000;
    const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let refresh_ms = match parse_or(
            "CATALOG_REFRESH_INTERVAL_MS",
            lookup("CATALOG_REFRESH_INTERVAL_MS"),
            Self::DEFAULT_REFRESH_INTERVAL_MS,
        ) {
            0 => {
                warn!(
                    "CATALOG_REFRESH_INTERVAL_MS=0 is not a usable period, using default {}",
                    Self::DEFAULT_REFRESH_INTERVAL_MS
                );
                Self::DEFAULT_REFRESH_INTERVAL_MS
            }
            ms => ms,
        };
        let timeout_ms = parse_or(
            "CATALOG_HTTP_TIMEOUT_MS",
            lookup("CATALOG_HTTP_TIMEOUT_MS"),
            Self::DEFAULT_HTTP_TIMEOUT_MS,
        );

        Self {
            api_url: var("CATALOG_API_URL", Self::DEFAULT_API_URL),
            api_prefix: var("CATALOG_API_PREFIX", Self::DEFAULT_API_PREFIX),
            brand_id: var("CATALOG_BRAND_ID", Self::DEFAULT_BRAND_ID),
            host: var("CATALOG_HOST", Self::DEFAULT_HOST),
            http_port: parse_or(
                "CATALOG_HTTP_PORT",
                lookup("CATALOG_HTTP_PORT"),
                Self::DEFAULT_HTTP_PORT,
            ),
            refresh_interval: Duration::from_millis(refresh_ms),
            http_timeout: Duration::from_millis(timeout_ms),
            max_brands: lookup("CATALOG_MAX_BRANDS").and_then(|raw| match raw.parse::<u64>() {
                Ok(0) | Err(_) => {
                    warn!("CATALOG_MAX_BRANDS={raw:?} is not a positive number, leaving caches unbounded");
                    None
                }
                Ok(n) => Some(n),
            }),
            handoff_path: lookup("CATALOG_HANDOFF_PATH").filter(|p| !p.trim().is_empty()),
            allowed_origins: var("CATALOG_ALLOWED_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Base URL of the catalog REST API, always ending in `/`.
    pub fn api_base(&self) -> String {
        let mut base = self.api_url.trim_end_matches('/').to_string();
        base.push('/');
        let prefix = self.api_prefix.trim_matches('/');
        if !prefix.is_empty() {
            base.push_str(prefix);
            base.push('/');
        }
        base
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match raw {
        None => default,
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("{name}={raw:?} is not valid, using default {default}");
            default
        }),
    }
}
