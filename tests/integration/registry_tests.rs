use std::sync::Arc;
use storefront_harvester::config::Config;
use storefront_harvester::engine::build_engines;
use storefront_harvester::{default_registry, HarvestError};

#[test]
fn test_resolve_is_stable() {
    let config = Arc::new(Config::default());
    let engines = build_engines(&config).unwrap();
    let registry = default_registry(&config, &engines);

    for capability in registry.capabilities() {
        let first = registry.resolve(&capability.key).unwrap();
        let second = registry.resolve(&capability.key).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.display_name(), capability.display_name);
    }
}

#[test]
fn test_capabilities_listed() {
    let config = Arc::new(Config::default());
    let registry = default_registry(&config, &[]);

    let names: Vec<String> = registry
        .capabilities()
        .into_iter()
        .map(|c| c.display_name)
        .collect();
    assert_eq!(names, vec!["Бауцентр", "Лемана ПРО", "Петрович"]);
}

#[test]
fn test_unknown_site_not_resolved() {
    let config = Arc::new(Config::default());
    let registry = default_registry(&config, &[]);

    assert!(matches!(
        registry.resolve("leroymerlin"),
        Err(HarvestError::AdapterNotFound { .. })
    ));
}
