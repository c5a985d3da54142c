use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub harvester: HarvesterConfig,
    #[serde(default)]
    pub challenge: ChallengeConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Crawl and worker pool behavior
#[derive(Debug, Clone, Deserialize)]
pub struct HarvesterConfig {
    /// Number of item-extraction workers per job
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Upper bound on listing pages visited per job
    #[serde(rename = "max-listing-pages", default = "default_max_listing_pages")]
    pub max_listing_pages: u32,

    /// Consecutive listing pages without new item links before stopping early
    #[serde(rename = "empty-page-streak", default = "default_empty_page_streak")]
    pub empty_page_streak: u32,

    /// Listing pages that must be visited before the empty streak may stop the crawl
    #[serde(
        rename = "min-pages-before-stop",
        default = "default_min_pages_before_stop"
    )]
    pub min_pages_before_stop: u32,

    /// Pause between listing pages (milliseconds)
    #[serde(rename = "page-delay-ms", default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
}

/// Anti-bot challenge retry behavior
#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeConfig {
    /// Total fetch attempts per page, including the first
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Base backoff (milliseconds), multiplied by the attempt number
    #[serde(rename = "backoff-ms", default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

/// Per-operation timeouts
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    /// Navigation timeout (seconds)
    #[serde(rename = "navigation-secs", default = "default_navigation_secs")]
    pub navigation_secs: u64,

    /// Wait between availability panel scroll rounds (milliseconds)
    #[serde(rename = "panel-settle-ms", default = "default_panel_settle_ms")]
    pub panel_settle_ms: u64,
}

/// Browser engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Engines in fallback priority order
    #[serde(default = "default_engines")]
    pub engines: Vec<String>,

    /// Locale sent as the preferred language
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Overrides the engine's built-in user agent
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,

    /// Extra headers sent with every request
    #[serde(rename = "extra-headers", default)]
    pub extra_headers: BTreeMap<String, String>,
}

/// Job store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl HarvesterConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

impl ChallengeConfig {
    /// Backoff before the retry following `attempt` (0-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(u64::from(attempt) + 1))
    }
}

impl TimeoutConfig {
    pub fn navigation(&self) -> Duration {
        Duration::from_secs(self.navigation_secs)
    }

    pub fn panel_settle(&self) -> Duration {
        Duration::from_millis(self.panel_settle_ms)
    }
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_listing_pages: default_max_listing_pages(),
            empty_page_streak: default_empty_page_streak(),
            min_pages_before_stop: default_min_pages_before_stop(),
            page_delay_ms: default_page_delay_ms(),
        }
    }
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            navigation_secs: default_navigation_secs(),
            panel_settle_ms: default_panel_settle_ms(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            engines: default_engines(),
            locale: default_locale(),
            user_agent: None,
            extra_headers: BTreeMap::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_workers() -> u32 {
    4
}

fn default_max_listing_pages() -> u32 {
    100
}

fn default_empty_page_streak() -> u32 {
    5
}

fn default_min_pages_before_stop() -> u32 {
    5
}

fn default_page_delay_ms() -> u64 {
    150
}

fn default_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1200
}

fn default_navigation_secs() -> u64 {
    60
}

fn default_panel_settle_ms() -> u64 {
    300
}

fn default_engines() -> Vec<String> {
    vec![
        "chromium".to_string(),
        "firefox".to_string(),
        "webkit".to_string(),
    ]
}

fn default_locale() -> String {
    "ru-RU".to_string()
}

fn default_database_path() -> String {
    "./harvest.db".to_string()
}
