//! Storefront Harvester: on-demand product scraping for a fixed set of retailers
//!
//! This crate runs scrape jobs against supported e-commerce sites, collecting the
//! name, price, stock and two caller-chosen attributes of every product reachable
//! from an entry URL, and persists the results in a job store.

pub mod config;
pub mod crawler;
pub mod engine;
pub mod extract;
pub mod jobs;
pub mod sites;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Parser for site '{key}' not found")]
    AdapterNotFound { key: String },

    #[error(
        "{url}: 0 product links (blocked={blocked}, title='{title}', pages visited={pages_visited})"
    )]
    NoItemLinks {
        url: String,
        pages_visited: usize,
        blocked: bool,
        title: String,
    },

    #[error("got {links} product links but 0 results. Sample errors: {sample}")]
    ZeroResults { links: usize, sample: String },

    #[error("Challenge page persisted at {url} after {attempts} attempts: {reason}")]
    ChallengeExhausted {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("Failed to extract {url}: {reason}")]
    ItemExtraction { url: String, reason: String },

    #[error("{site}: 0 items. {reasons}")]
    AllEnginesFailed { site: String, reasons: String },

    #[error("Engine error: {0}")]
    Engine(#[from] engine::EngineError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Job {0} not found")]
    JobNotFound(i64),

    #[error("Job task aborted: {0}")]
    TaskPanicked(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown engine in config: {0}")]
    UnknownEngine(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{ExtractedRecord, Field, UNKNOWN};
pub use jobs::JobRunner;
pub use sites::{default_registry, ParserRegistry, SiteAdapter};
pub use state::JobStatus;
pub use url::canonicalize_url;
