use std::sync::{Arc, Mutex};
use storefront_harvester::config::{
    BrowserConfig, ChallengeConfig, Config, HarvesterConfig, StorageConfig, TimeoutConfig,
};
use storefront_harvester::engine::build_engines;
use storefront_harvester::jobs::SharedStore;
use storefront_harvester::storage::SqliteJobStore;
use storefront_harvester::{default_registry, JobRunner};
use tempfile::TempDir;

/// Creates a configuration with delays short enough for tests
pub fn test_config(db_path: &str) -> Config {
    Config {
        harvester: HarvesterConfig {
            workers: 2,
            max_listing_pages: 10,
            empty_page_streak: 2,
            min_pages_before_stop: 1,
            page_delay_ms: 1,
        },
        challenge: ChallengeConfig {
            attempts: 3,
            backoff_ms: 1,
        },
        timeouts: TimeoutConfig {
            navigation_secs: 5,
            panel_settle_ms: 1,
        },
        browser: BrowserConfig {
            engines: vec!["chromium".to_string()],
            ..BrowserConfig::default()
        },
        storage: StorageConfig {
            database_path: db_path.to_string(),
        },
    }
}

/// Builds a runner over the default registry and a fresh database in `dir`
pub fn test_runner(dir: &TempDir) -> JobRunner {
    let db_path = dir.path().join("jobs.db");
    let config = Arc::new(test_config(db_path.to_str().unwrap()));
    let engines = build_engines(&config).unwrap();
    let registry = Arc::new(default_registry(&config, &engines));
    let store: SharedStore = Arc::new(Mutex::new(SqliteJobStore::new(&db_path).unwrap()));
    JobRunner::new(registry, store)
}

/// A Бауцентр-style listing page with the given product paths
pub fn listing_page(declared: usize, products: &[&str], next: Option<&str>) -> String {
    let cards: String = products
        .iter()
        .enumerate()
        .map(|(i, path)| {
            format!(
                r#"<div data-product-card-id="{}"><a href="{}">Товар {}</a></div>"#,
                i, path, i
            )
        })
        .collect();
    let next = next
        .map(|href| format!(r#"<a rel="next" href="{}">Далее</a>"#, href))
        .unwrap_or_default();
    format!(
        "<html><head><title>Дрели</title></head><body><p>{} товаров</p>{}{}</body></html>",
        declared, cards, next
    )
}

/// A Бауцентр-style product page
pub fn product_page(name: &str, price: &str, power: &str) -> String {
    format!(
        r#"<html><body>
        <h1>{}</h1>
        <span class="styled__MainPrice-sc-1">{}</span>
        <span class="styled__CopiedTypography-sc-2"><span>ART-{}</span></span>
        <ul class="styled__AvailabilitiesList-sc-3"><li><p>В наличии 5 шт</p></li></ul>
        <div class="styled__ProductCardProperty-sc-4"><span>Мощность, Вт</span><p>{}</p></div>
        </body></html>"#,
        name,
        price,
        name.len(),
        power
    )
}
