//! Generic adapter pipeline driven by a `SiteProfile`

use super::profile::SiteProfile;
use super::{ExtractRequest, SiteAdapter};
use crate::config::Config;
use crate::crawler::{
    classify_entry, discover_item_links, navigate_with_retries, run_with_fallback, ContextRun,
    Diagnostics, EntryKind, Extraction, ItemExtractor, WorkerPool,
};
use crate::engine::{has_element, BrowserContext, Engine, Page};
use crate::extract::{extract_record, read_stock_panel, ExtractedRecord, Field};
use crate::url::canonicalize;
use crate::{HarvestError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Number of per-item failures quoted in a `ZeroResults` error
const SAMPLE_FAILURES: usize = 5;

/// Site adapter built from a profile
pub struct CatalogAdapter {
    profile: SiteProfile,
    config: Arc<Config>,
    engines: Vec<Arc<dyn Engine>>,
}

impl CatalogAdapter {
    pub fn new(profile: SiteProfile, config: Arc<Config>, engines: Vec<Arc<dyn Engine>>) -> Self {
        Self {
            profile,
            config,
            engines,
        }
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    /// Engines this adapter runs under, in priority order
    ///
    /// Sites without fallback only use the primary engine.
    pub fn engines(&self) -> &[Arc<dyn Engine>] {
        if self.profile.engine_fallback {
            &self.engines
        } else {
            &self.engines[..self.engines.len().min(1)]
        }
    }
}

#[async_trait]
impl SiteAdapter for CatalogAdapter {
    fn key(&self) -> &str {
        self.profile.key
    }

    fn display_name(&self) -> &str {
        self.profile.display_name
    }

    async fn extract(&self, request: &ExtractRequest) -> Result<Extraction> {
        let run = CatalogRun {
            profile: &self.profile,
            config: &self.config,
            request,
        };
        run_with_fallback(self.profile.key, self.engines(), &run).await
    }
}

/// One extraction attempt of a request inside one context
struct CatalogRun<'a> {
    profile: &'a SiteProfile,
    config: &'a Config,
    request: &'a ExtractRequest,
}

#[async_trait]
impl ContextRun for CatalogRun<'_> {
    async fn run_in(&self, context: &dyn BrowserContext) -> Result<Extraction> {
        let entry = canonicalize(self.request.entry_url.clone())?;
        let mut diagnostics = Diagnostics::default();

        let links = match classify_entry(&entry, &self.profile.listing.item) {
            EntryKind::SingleItem => {
                tracing::debug!("{} is a single item", entry);
                vec![entry.clone()]
            }
            EntryKind::Listing => {
                let mut page = context.new_page().await?;
                let outcome = discover_item_links(
                    page.as_mut(),
                    &entry,
                    &self.profile.listing,
                    self.config,
                    &mut diagnostics,
                )
                .await;
                page.close().await;

                let outcome = outcome?;
                if outcome.links.is_empty() {
                    return Err(HarvestError::NoItemLinks {
                        url: entry.to_string(),
                        pages_visited: outcome.pages_visited,
                        blocked: outcome.blocked,
                        title: outcome.title,
                    });
                }
                tracing::info!(
                    "{}: {} item links over {} pages",
                    self.profile.key,
                    outcome.links.len(),
                    outcome.pages_visited
                );
                outcome.links
            }
        };

        let link_count = links.len();
        let job = ItemJob {
            profile: self.profile,
            config: self.config,
            tx1: &self.request.tx1,
            tx2: &self.request.tx2,
        };
        let outcome = WorkerPool::new(self.config.harvester.workers)
            .run(context, links, &job)
            .await;
        diagnostics.merge(outcome.diagnostics);

        if outcome.records.is_empty() {
            return Err(HarvestError::ZeroResults {
                links: link_count,
                sample: diagnostics.sample_item_failures(SAMPLE_FAILURES),
            });
        }

        Ok(Extraction {
            records: outcome.records,
            diagnostics,
        })
    }
}

/// Extraction of a single item page
struct ItemJob<'a> {
    profile: &'a SiteProfile,
    config: &'a Config,
    tx1: &'a str,
    tx2: &'a str,
}

#[async_trait]
impl ItemExtractor for ItemJob<'_> {
    async fn extract_item(&self, page: &mut dyn Page, url: &Url) -> Result<ExtractedRecord> {
        let failed = |reason: String| HarvestError::ItemExtraction {
            url: url.to_string(),
            reason,
        };

        let nav = navigate_with_retries(page, url, &self.config.challenge)
            .await
            .map_err(|e| failed(e.to_string()))?;
        if nav.status >= 400 {
            return Err(failed(format!("HTTP {}", nav.status)));
        }

        let settle = self.config.timeouts.panel_settle();
        expand_sections(page, self.profile.expanders, settle).await;

        let panel_stock = match &self.profile.stock_panel {
            Some(panel) => read_stock_panel(page, panel, settle).await,
            None => Field::Unresolved,
        };

        let record = extract_record(
            page.content(),
            url,
            &self.profile.fields,
            self.tx1,
            self.tx2,
            panel_stock,
        );
        tracing::trace!("Extracted {}: price={} stock={}", url, record.price, record.stock);
        Ok(record)
    }
}

/// Clicks every expander present on the page; failures are ignored
async fn expand_sections(page: &mut dyn Page, expanders: &[&str], settle: Duration) {
    for selector in expanders {
        if !has_element(page.content(), selector) {
            continue;
        }
        match page.click(selector).await {
            Ok(true) => page.wait(settle).await,
            Ok(false) => {}
            Err(e) => tracing::debug!("Expander {} failed: {}", selector, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{DeclaredTotal, ItemShape, ListingRules};
    use crate::engine::{EngineError, Navigation};
    use crate::extract::FieldSelectors;
    use std::collections::HashMap;

    const PROFILE: SiteProfile = SiteProfile {
        key: "shop",
        display_name: "Shop",
        listing: ListingRules {
            item: ItemShape {
                anchors: r#"a[href*="/product/"]"#,
                path_prefix: "/product/",
                min_segments: 2,
            },
            paginators: &[],
            declared_total: DeclaredTotal::Absent,
            consent_buttons: &[],
        },
        fields: FieldSelectors {
            name: &["h1"],
            price: &[".price"],
            article: &[".sku"],
            article_row: None,
            stock_labels: &[],
            attribute_blocks: &[],
        },
        stock_panel: None,
        expanders: &[],
        engine_fallback: false,
    };

    /// Serves fixed documents by path; unknown paths are 404s
    struct SitePage {
        site: Arc<HashMap<String, String>>,
        url: Option<Url>,
        html: String,
    }

    #[async_trait]
    impl Page for SitePage {
        async fn goto(&mut self, url: &Url) -> std::result::Result<Navigation, EngineError> {
            let (status, html) = match self.site.get(url.path()) {
                Some(html) => (200, html.clone()),
                None => (404, "<html><title>Not found</title></html>".to_string()),
            };
            self.url = Some(url.clone());
            self.html = html;
            Ok(Navigation {
                url: url.clone(),
                status,
            })
        }

        async fn reload(&mut self) -> std::result::Result<Navigation, EngineError> {
            let url = self.url.clone().ok_or(EngineError::NoDocument)?;
            self.goto(&url).await
        }

        fn content(&self) -> &str {
            &self.html
        }

        fn current_url(&self) -> Option<&Url> {
            self.url.as_ref()
        }

        async fn click(&mut self, _selector: &str) -> std::result::Result<bool, EngineError> {
            Ok(false)
        }

        async fn scroll_to_end(
            &mut self,
            _selector: &str,
        ) -> std::result::Result<Option<u64>, EngineError> {
            Ok(None)
        }

        async fn wait(&self, _duration: Duration) {}
    }

    struct SiteContext {
        site: Arc<HashMap<String, String>>,
    }

    #[async_trait]
    impl BrowserContext for SiteContext {
        async fn new_page(&self) -> std::result::Result<Box<dyn Page>, EngineError> {
            Ok(Box::new(SitePage {
                site: self.site.clone(),
                url: None,
                html: String::new(),
            }))
        }

        async fn close(&self) {}
    }

    fn context(pages: &[(&str, &str)]) -> SiteContext {
        SiteContext {
            site: Arc::new(
                pages
                    .iter()
                    .map(|(path, html)| (path.to_string(), html.to_string()))
                    .collect(),
            ),
        }
    }

    fn request(url: &str) -> ExtractRequest {
        ExtractRequest {
            entry_url: Url::parse(url).unwrap(),
            tx1: "Мощность".to_string(),
            tx2: "Вес".to_string(),
        }
    }

    const ITEM: &str = r#"<html><body>
        <h1>Дрель ударная</h1><span class="price">4 590 ₽</span><span class="sku">D-1</span>
        <table><tr><td>Мощность</td><td>750 Вт</td></tr></table>
        </body></html>"#;

    #[tokio::test]
    async fn test_listing_to_records() {
        let config = Config::default();
        let request = request("https://shop.test/catalog/drills/");
        let run = CatalogRun {
            profile: &PROFILE,
            config: &config,
            request: &request,
        };
        let ctx = context(&[
            (
                "/catalog/drills/",
                r#"<a href="/product/a/">a</a><a href="/product/b/">b</a><a href="/product/gone/">c</a>"#,
            ),
            ("/product/a/", ITEM),
            ("/product/b/", ITEM),
        ]);

        let extraction = run.run_in(&ctx).await.unwrap();

        assert_eq!(extraction.records.len(), 2);
        let record = &extraction.records[0];
        assert_eq!(record.name, Field::Resolved("Дрель ударная".to_string()));
        assert_eq!(record.price, Field::Resolved(4590));
        assert_eq!(record.article, Field::Resolved("D-1".to_string()));
        assert_eq!(record.tx1, Field::Resolved("750 Вт".to_string()));
        assert_eq!(record.tx2, Field::Unresolved);

        assert_eq!(extraction.diagnostics.item_failures.len(), 1);
        assert!(extraction.diagnostics.item_failures[0]
            .reason
            .contains("HTTP 404"));
    }

    #[tokio::test]
    async fn test_single_item_entry() {
        let config = Config::default();
        let request = request("https://shop.test/product/a/?utm_source=feed");
        let run = CatalogRun {
            profile: &PROFILE,
            config: &config,
            request: &request,
        };
        let ctx = context(&[("/product/a/", ITEM)]);

        let extraction = run.run_in(&ctx).await.unwrap();
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].url, "https://shop.test/product/a/");
    }

    #[tokio::test]
    async fn test_listing_without_links_fails() {
        let config = Config::default();
        let request = request("https://shop.test/catalog/empty/");
        let run = CatalogRun {
            profile: &PROFILE,
            config: &config,
            request: &request,
        };
        let ctx = context(&[(
            "/catalog/empty/",
            "<html><head><title>Пусто</title></head><body></body></html>",
        )]);

        let err = run.run_in(&ctx).await.unwrap_err();
        match err {
            HarvestError::NoItemLinks {
                title,
                blocked,
                pages_visited,
                ..
            } => {
                assert_eq!(title, "Пусто");
                assert!(!blocked);
                assert_eq!(pages_visited, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_links_without_records_fails_with_sample() {
        let config = Config::default();
        let request = request("https://shop.test/catalog/drills/");
        let run = CatalogRun {
            profile: &PROFILE,
            config: &config,
            request: &request,
        };
        let ctx = context(&[(
            "/catalog/drills/",
            r#"<a href="/product/x/">x</a><a href="/product/y/">y</a>"#,
        )]);

        let err = run.run_in(&ctx).await.unwrap_err();
        match err {
            HarvestError::ZeroResults { links, sample } => {
                assert_eq!(links, 2);
                assert!(sample.contains("HTTP 404"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_engines_without_fallback_uses_primary_only() {
        let mut config = Config::default();
        config.browser.engines = vec!["chromium".to_string(), "firefox".to_string()];
        let engines = crate::engine::build_engines(&config).unwrap();
        let config = Arc::new(config);

        let single = CatalogAdapter::new(PROFILE, config.clone(), engines.clone());
        assert_eq!(single.engines().len(), 1);
        assert_eq!(single.engines()[0].name(), "chromium");

        let fallback = CatalogAdapter::new(
            SiteProfile {
                engine_fallback: true,
                ..PROFILE
            },
            config,
            engines,
        );
        assert_eq!(fallback.engines().len(), 2);
    }
}
