//! Browser engine abstraction
//!
//! Site adapters drive pages through these traits rather than a concrete client:
//! - `Engine`: a named engine that can open isolated contexts
//! - `BrowserContext`: cookie jar, locale and headers shared by the pages of one job
//! - `Page`: a single tab with navigation, reload, timed waits and interactions
//!
//! The shipped implementation is `HttpEngine`, which speaks plain HTTP with an
//! engine-specific client profile. It cannot execute scripts, so clicks report
//! that nothing happened and adapters fall back to what the server rendered.

mod http;

pub use http::{build_http_client, HttpEngine};

use crate::config::Config;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised by engines while driving a page
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Navigation to {url} timed out")]
    Timeout { url: String },

    #[error("Page has no document loaded")]
    NoDocument,

    #[error("Failed to set up engine client: {0}")]
    Client(String),
}

/// Known engine profiles, in default fallback order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    Chromium,
    Firefox,
    Webkit,
}

impl EngineKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Some(Self::Chromium),
            "firefox" => Some(Self::Firefox),
            "webkit" | "safari" => Some(Self::Webkit),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Firefox => "firefox",
            Self::Webkit => "webkit",
        }
    }

    /// A realistic desktop user agent for this engine
    pub fn default_user_agent(&self) -> &'static str {
        match self {
            Self::Chromium => {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36"
            }
            Self::Firefox => {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:126.0) Gecko/20100101 Firefox/126.0"
            }
            Self::Webkit => {
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 \
                 (KHTML, like Gecko) Version/17.4 Safari/605.1.15"
            }
        }
    }

    /// Client hint headers this engine sends on navigation
    pub fn client_hints(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Chromium => &[
                (
                    "sec-ch-ua",
                    "\"Google Chrome\";v=\"125\", \"Chromium\";v=\"125\", \"Not:A-Brand\";v=\"24\"",
                ),
                ("sec-ch-ua-mobile", "?0"),
                ("sec-ch-ua-platform", "\"Windows\""),
            ],
            Self::Firefox | Self::Webkit => &[],
        }
    }
}

/// Result of a navigation or reload
#[derive(Debug, Clone)]
pub struct Navigation {
    /// Final URL after redirects
    pub url: Url,

    /// HTTP status of the main document
    pub status: u16,
}

/// A named browser engine that opens isolated contexts
#[async_trait]
pub trait Engine: Send + Sync {
    fn name(&self) -> &str;

    /// Opens a fresh context with its own cookies, never shared with another job
    async fn new_context(&self) -> Result<Arc<dyn BrowserContext>, EngineError>;
}

/// An isolated browsing context; pages opened from it share cookies and headers
#[async_trait]
pub trait BrowserContext: Send + Sync {
    async fn new_page(&self) -> Result<Box<dyn Page>, EngineError>;

    async fn close(&self);
}

/// One tab inside a context
#[async_trait]
pub trait Page: Send + Sync {
    /// Navigates to `url` and loads its document
    async fn goto(&mut self, url: &Url) -> Result<Navigation, EngineError>;

    /// Reloads the current document
    async fn reload(&mut self) -> Result<Navigation, EngineError>;

    /// HTML of the current document (empty before the first navigation)
    fn content(&self) -> &str;

    fn current_url(&self) -> Option<&Url>;

    /// Clicks the first element matching `selector`
    ///
    /// Returns false if nothing was clicked.
    async fn click(&mut self, selector: &str) -> Result<bool, EngineError>;

    /// Scrolls the element matching `selector` to its end and returns its height
    ///
    /// Returns None if the element does not exist.
    async fn scroll_to_end(&mut self, selector: &str) -> Result<Option<u64>, EngineError>;

    /// Timed wait; a suspension point
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn close(&mut self) {}
}

/// Returns true if the document contains an element matching `selector`
pub fn has_element(html: &str, selector: &str) -> bool {
    let Ok(selector) = Selector::parse(selector) else {
        return false;
    };
    Html::parse_document(html).select(&selector).next().is_some()
}

/// Extracts the document title
pub fn document_title(html: &str) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    Html::parse_document(html)
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Builds the configured engines in fallback priority order
pub fn build_engines(config: &Config) -> Result<Vec<Arc<dyn Engine>>, EngineError> {
    config
        .browser
        .engines
        .iter()
        .map(|name| {
            let kind = EngineKind::from_name(name)
                .ok_or_else(|| EngineError::Client(format!("unknown engine '{}'", name)))?;
            let engine: Arc<dyn Engine> = Arc::new(HttpEngine::new(kind, config));
            Ok(engine)
        })
        .collect()
}
