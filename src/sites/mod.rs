//! Supported retailers
//!
//! Every site is described by a `SiteProfile` and served by a `CatalogAdapter`.
//! `default_registry` is the single place where sites are registered.

mod baucenter;
mod catalog;
mod lemanapro;
mod petrovich;
mod profile;
mod registry;

pub use catalog::CatalogAdapter;
pub use profile::SiteProfile;
pub use registry::{ParserRegistry, SiteCapability};

pub use crate::crawler::Extraction;

use crate::config::Config;
use crate::engine::Engine;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

/// Input of one adapter run
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub entry_url: Url,
    /// First caller-chosen attribute label
    pub tx1: String,
    /// Second caller-chosen attribute label
    pub tx2: String,
}

/// Per-retailer extraction pipeline
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    /// Capability key, e.g. `petrovich`
    fn key(&self) -> &str;

    fn display_name(&self) -> &str;

    /// Extracts every item reachable from the request's entry URL
    ///
    /// # Errors
    ///
    /// Fails when nothing could be extracted; individual item failures are reported
    /// in the returned diagnostics instead.
    async fn extract(&self, request: &ExtractRequest) -> Result<Extraction>;
}

/// Profiles of every supported site
pub const PROFILES: &[SiteProfile] = &[baucenter::PROFILE, lemanapro::PROFILE, petrovich::PROFILE];

/// Builds the registry of every supported site
///
/// # Arguments
///
/// * `config` - Shared configuration
/// * `engines` - Engines in fallback priority order
pub fn default_registry(config: &Arc<Config>, engines: &[Arc<dyn Engine>]) -> ParserRegistry {
    let mut registry = ParserRegistry::new();
    for profile in PROFILES {
        let adapter = CatalogAdapter::new(*profile, Arc::clone(config), engines.to_vec());
        registry.register(profile.key, Arc::new(adapter));
    }
    tracing::debug!("Registered {} site adapters", registry.len());
    registry
}
