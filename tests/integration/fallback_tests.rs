use crate::common::{product_page, test_config};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use storefront_harvester::engine::{
    BrowserContext, Engine, EngineError, EngineKind, HttpEngine, Navigation, Page,
};
use storefront_harvester::sites::{CatalogAdapter, ExtractRequest, SiteAdapter, PROFILES};
use storefront_harvester::HarvestError;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Engine whose every page is stuck on an anti-bot interstitial
struct ChallengedEngine {
    contexts_closed: Arc<AtomicUsize>,
}

struct ChallengedContext {
    closed: Arc<AtomicUsize>,
}

struct ChallengedPage {
    url: Option<Url>,
}

const INTERSTITIAL: &str = "<html><head><title>Just a moment...</title></head></html>";

#[async_trait]
impl Engine for ChallengedEngine {
    fn name(&self) -> &str {
        "chromium"
    }

    async fn new_context(&self) -> Result<Arc<dyn BrowserContext>, EngineError> {
        Ok(Arc::new(ChallengedContext {
            closed: self.contexts_closed.clone(),
        }))
    }
}

#[async_trait]
impl BrowserContext for ChallengedContext {
    async fn new_page(&self) -> Result<Box<dyn Page>, EngineError> {
        Ok(Box::new(ChallengedPage { url: None }))
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Page for ChallengedPage {
    async fn goto(&mut self, url: &Url) -> Result<Navigation, EngineError> {
        self.url = Some(url.clone());
        Ok(Navigation {
            url: url.clone(),
            status: 403,
        })
    }

    async fn reload(&mut self) -> Result<Navigation, EngineError> {
        let url = self.url.clone().ok_or(EngineError::NoDocument)?;
        self.goto(&url).await
    }

    fn content(&self) -> &str {
        if self.url.is_some() {
            INTERSTITIAL
        } else {
            ""
        }
    }

    fn current_url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    async fn click(&mut self, _selector: &str) -> Result<bool, EngineError> {
        Ok(false)
    }

    async fn scroll_to_end(&mut self, _selector: &str) -> Result<Option<u64>, EngineError> {
        Ok(None)
    }
}

fn lemanapro_adapter(engines: Vec<Arc<dyn Engine>>) -> CatalogAdapter {
    let profile = PROFILES
        .iter()
        .find(|p| p.key == "lemanapro")
        .copied()
        .unwrap();
    let config = Arc::new(test_config(":memory:"));
    CatalogAdapter::new(profile, config, engines)
}

async fn mount_listing(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/catalogue/perforatory/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><body>
               <a href="/product/perforator-1/">1</a>
               <a href="/product/perforator-2/">2</a>
               </body></html>"#,
            "text/html; charset=utf-8",
        ))
        .mount(server)
        .await;

    for slug in ["perforator-1", "perforator-2"] {
        Mock::given(method("GET"))
            .and(path(format!("/product/{}/", slug)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(product_page(slug, "8 990 ₽", "800"), "text/html; charset=utf-8"),
            )
            .expect(1)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_secondary_engine_wins() {
    let server = MockServer::start().await;
    mount_listing(&server).await;

    let closed = Arc::new(AtomicUsize::new(0));
    let config = test_config(":memory:");
    let engines: Vec<Arc<dyn Engine>> = vec![
        Arc::new(ChallengedEngine {
            contexts_closed: closed.clone(),
        }),
        Arc::new(HttpEngine::new(EngineKind::Firefox, &config)),
    ];
    let adapter = lemanapro_adapter(engines);

    let request = ExtractRequest {
        entry_url: Url::parse(&format!("{}/catalogue/perforatory/", server.uri())).unwrap(),
        tx1: "Мощность".to_string(),
        tx2: String::new(),
    };
    let extraction = adapter.extract(&request).await.unwrap();

    assert_eq!(extraction.records.len(), 2);
    assert!(extraction
        .records
        .iter()
        .all(|r| r.price.to_string() == "8990"));

    let failures = &extraction.diagnostics.engine_failures;
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].engine, "chromium");
    assert!(failures[0].reason.contains("0 product links"));
    assert!(failures[0].reason.contains("blocked=true"));
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_all_engines_blocked() {
    let closed = Arc::new(AtomicUsize::new(0));
    let engines: Vec<Arc<dyn Engine>> = (0..2)
        .map(|_| {
            let engine: Arc<dyn Engine> = Arc::new(ChallengedEngine {
                contexts_closed: closed.clone(),
            });
            engine
        })
        .collect();
    let adapter = lemanapro_adapter(engines);

    let request = ExtractRequest {
        entry_url: Url::parse("https://lemanapro.test/catalogue/perforatory/").unwrap(),
        tx1: String::new(),
        tx2: String::new(),
    };
    let err = adapter.extract(&request).await.unwrap_err();

    match err {
        HarvestError::AllEnginesFailed { site, reasons } => {
            assert_eq!(site, "lemanapro");
            assert_eq!(reasons.matches("0 product links").count(), 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(closed.load(Ordering::SeqCst), 2);
}
