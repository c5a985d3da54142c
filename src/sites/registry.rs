//! Parser registry: site capability key to adapter

use super::SiteAdapter;
use crate::{HarvestError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A supported site as listed to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteCapability {
    pub key: String,
    pub display_name: String,
}

/// Maps site keys to their adapters
///
/// Built once at startup and shared behind an `Arc`; lookups never lock.
#[derive(Default)]
pub struct ParserRegistry {
    adapters: BTreeMap<String, Arc<dyn SiteAdapter>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `adapter` under `key`, replacing any adapter already there
    ///
    /// Returns the replaced adapter, if any.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        adapter: Arc<dyn SiteAdapter>,
    ) -> Option<Arc<dyn SiteAdapter>> {
        let key = key.into();
        let previous = self.adapters.insert(key.clone(), adapter);
        if previous.is_some() {
            tracing::debug!("Replaced adapter for site '{}'", key);
        }
        previous
    }

    pub fn lookup(&self, key: &str) -> Option<Arc<dyn SiteAdapter>> {
        self.adapters.get(key).cloned()
    }

    /// Looks up the adapter for `key`
    ///
    /// # Errors
    ///
    /// * `AdapterNotFound` - no adapter is registered under `key`
    pub fn resolve(&self, key: &str) -> Result<Arc<dyn SiteAdapter>> {
        self.lookup(key).ok_or_else(|| HarvestError::AdapterNotFound {
            key: key.to_string(),
        })
    }

    /// Supported sites, sorted by key
    pub fn capabilities(&self) -> Vec<SiteCapability> {
        self.adapters
            .iter()
            .map(|(key, adapter)| SiteCapability {
                key: key.clone(),
                display_name: adapter.display_name().to_string(),
            })
            .collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::Extraction;
    use crate::sites::ExtractRequest;
    use async_trait::async_trait;

    struct NamedAdapter(&'static str);

    #[async_trait]
    impl SiteAdapter for NamedAdapter {
        fn key(&self) -> &str {
            "test"
        }

        fn display_name(&self) -> &str {
            self.0
        }

        async fn extract(&self, _request: &ExtractRequest) -> Result<Extraction> {
            Ok(Extraction::default())
        }
    }

    #[test]
    fn test_resolve_returns_same_adapter() {
        let mut registry = ParserRegistry::new();
        registry.register("petrovich", Arc::new(NamedAdapter("Петрович")));

        let first = registry.resolve("petrovich").unwrap();
        let second = registry.resolve("petrovich").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_register_last_write_wins() {
        let mut registry = ParserRegistry::new();
        assert!(registry
            .register("baucenter", Arc::new(NamedAdapter("old")))
            .is_none());
        let replaced = registry.register("baucenter", Arc::new(NamedAdapter("new")));

        assert_eq!(replaced.unwrap().display_name(), "old");
        assert_eq!(registry.resolve("baucenter").unwrap().display_name(), "new");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_key() {
        let registry = ParserRegistry::new();
        assert!(registry.lookup("ozon").is_none());
        let err = registry.resolve("ozon").err().unwrap();
        assert!(matches!(err, HarvestError::AdapterNotFound { key } if key == "ozon"));
    }

    #[test]
    fn test_capabilities_sorted_by_key() {
        let mut registry = ParserRegistry::new();
        registry.register("petrovich", Arc::new(NamedAdapter("Петрович")));
        registry.register("baucenter", Arc::new(NamedAdapter("Бауцентр")));

        let capabilities = registry.capabilities();
        let keys: Vec<&str> = capabilities.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["baucenter", "petrovich"]);
        assert_eq!(capabilities[0].display_name, "Бауцентр");
    }
}
