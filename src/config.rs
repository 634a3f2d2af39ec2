//! Environment-driven configuration for the dashboard controller.

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the scoring/explanation service. When absent the binary
    /// falls back to the built-in mock dataset behind the same traits.
    pub api_base: Option<String>,
    /// Base URL used to build canonical shareable links.
    pub share_base: String,
    /// Directory export artifacts are written to.
    pub download_dir: String,
    /// Auto-refresh interval for the explanation record.
    pub refresh_interval_secs: u64,
    /// Whether auto-refresh starts enabled.
    pub auto_refresh: bool,
    pub http_timeout_secs: u64,
    /// Upper bound on the comparison snapshot list.
    pub max_comparisons: usize,
    /// Default date-range filter for the history/trends sections.
    pub default_date_range_days: u32,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            api_base: std::env::var("EXPLAIN_API_BASE").ok().filter(|s| !s.is_empty()),
            share_base: std::env::var("SHARE_BASE")
                .unwrap_or_else(|_| "https://app.cognidash.example".to_string()),
            download_dir: std::env::var("DOWNLOAD_DIR").unwrap_or_else(|_| "./downloads".to_string()),
            refresh_interval_secs: std::env::var("REFRESH_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(30),
            auto_refresh: std::env::var("AUTO_REFRESH")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(10),
            max_comparisons: std::env::var("MAX_COMPARISONS").ok().and_then(|v| v.parse().ok()).unwrap_or(4),
            default_date_range_days: std::env::var("DATE_RANGE_DAYS").ok().and_then(|v| v.parse().ok()).unwrap_or(30),
            retry_max_attempts: std::env::var("RETRY_MAX").ok().and_then(|v| v.parse().ok()).unwrap_or(3),
            retry_base_delay_ms: std::env::var("RETRY_BASE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(100),
            retry_max_delay_ms: std::env::var("RETRY_MAX_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(5000),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: None,
            share_base: "https://app.cognidash.example".to_string(),
            download_dir: "./downloads".to_string(),
            refresh_interval_secs: 30,
            auto_refresh: false,
            http_timeout_secs: 10,
            max_comparisons: 4,
            default_date_range_days: 30,
            retry_max_attempts: 3,
            retry_base_delay_ms: 100,
            retry_max_delay_ms: 5000,
        }
    }
}
