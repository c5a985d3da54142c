//! HTTP engine implementation
//!
//! Each context is a separate `reqwest::Client` with its own cookie store, so
//! nothing leaks between jobs or between engines of the same job. Pages opened
//! from a context share its client.

use crate::config::Config;
use crate::engine::{BrowserContext, Engine, EngineError, EngineKind, Navigation, Page};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Engine that fetches documents over HTTP with a browser-like client profile
pub struct HttpEngine {
    kind: EngineKind,
    user_agent: String,
    locale: String,
    extra_headers: Vec<(String, String)>,
    navigation_timeout: Duration,
}

impl HttpEngine {
    pub fn new(kind: EngineKind, config: &Config) -> Self {
        let user_agent = config
            .browser
            .user_agent
            .clone()
            .unwrap_or_else(|| kind.default_user_agent().to_string());

        Self {
            kind,
            user_agent,
            locale: config.browser.locale.clone(),
            extra_headers: config
                .browser
                .extra_headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            navigation_timeout: config.timeouts.navigation(),
        }
    }

    fn default_headers(&self) -> Result<HeaderMap, EngineError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(
            ACCEPT_LANGUAGE,
            header_value(&accept_language(&self.locale))?,
        );
        headers.insert(
            HeaderName::from_static("upgrade-insecure-requests"),
            HeaderValue::from_static("1"),
        );

        for (name, value) in self.kind.client_hints() {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }

        for (name, value) in &self.extra_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| EngineError::Client(format!("invalid header {}: {}", name, e)))?;
            headers.insert(name, header_value(value)?);
        }

        Ok(headers)
    }
}

#[async_trait]
impl Engine for HttpEngine {
    fn name(&self) -> &str {
        self.kind.name()
    }

    async fn new_context(&self) -> Result<Arc<dyn BrowserContext>, EngineError> {
        let client = build_http_client(
            &self.user_agent,
            self.default_headers()?,
            self.navigation_timeout,
        )
        .map_err(|e| EngineError::Client(e.to_string()))?;

        tracing::debug!("Opened {} context", self.kind.name());
        Ok(Arc::new(HttpContext { client }))
    }
}

/// Builds an HTTP client with a private cookie store
///
/// # Arguments
///
/// * `user_agent` - The user agent to send
/// * `headers` - Headers sent with every request
/// * `timeout` - Navigation timeout for a whole request
pub fn build_http_client(
    user_agent: &str,
    headers: HeaderMap,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .cookie_store(true)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

struct HttpContext {
    client: Client,
}

#[async_trait]
impl BrowserContext for HttpContext {
    async fn new_page(&self) -> Result<Box<dyn Page>, EngineError> {
        Ok(Box::new(HttpPage {
            client: self.client.clone(),
            url: None,
            html: String::new(),
        }))
    }

    async fn close(&self) {}
}

struct HttpPage {
    client: Client,
    url: Option<Url>,
    html: String,
}

impl HttpPage {
    async fn load(&mut self, url: &Url) -> Result<Navigation, EngineError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_request_error(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| classify_request_error(url, e))?;

        tracing::trace!("Loaded {} ({} bytes, HTTP {})", final_url, body.len(), status);

        self.html = body;
        self.url = Some(final_url.clone());
        Ok(Navigation {
            url: final_url,
            status,
        })
    }
}

#[async_trait]
impl Page for HttpPage {
    async fn goto(&mut self, url: &Url) -> Result<Navigation, EngineError> {
        self.load(url).await
    }

    async fn reload(&mut self) -> Result<Navigation, EngineError> {
        let url = self.url.clone().ok_or(EngineError::NoDocument)?;
        self.load(&url).await
    }

    fn content(&self) -> &str {
        &self.html
    }

    fn current_url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    async fn click(&mut self, selector: &str) -> Result<bool, EngineError> {
        tracing::trace!("Click on '{}' skipped: no script support", selector);
        Ok(false)
    }

    async fn scroll_to_end(&mut self, selector: &str) -> Result<Option<u64>, EngineError> {
        Ok(rendered_height(&self.html, selector))
    }
}

/// Size of the server-rendered element, standing in for its scroll height
fn rendered_height(html: &str, selector: &str) -> Option<u64> {
    let selector = Selector::parse(selector).ok()?;
    Html::parse_document(html)
        .select(&selector)
        .next()
        .map(|element| element.html().len() as u64)
}

fn classify_request_error(url: &Url, error: reqwest::Error) -> EngineError {
    if error.is_timeout() {
        EngineError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        EngineError::Navigation {
            url: url.to_string(),
            reason: "Connection refused".to_string(),
        }
    } else {
        EngineError::Navigation {
            url: url.to_string(),
            reason: error.to_string(),
        }
    }
}

fn header_value(value: &str) -> Result<HeaderValue, EngineError> {
    HeaderValue::from_str(value)
        .map_err(|e| EngineError::Client(format!("invalid header value '{}': {}", value, e)))
}

/// Builds an Accept-Language value preferring `locale`, e.g. `ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7`
fn accept_language(locale: &str) -> String {
    let language = locale.split(['-', '_']).next().unwrap_or(locale);
    format!("{},{};q=0.9,en-US;q=0.8,en;q=0.7", locale, language)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    /// Header value as sent, rejoined if the server split it on commas
    fn sent_header(request: &Request, name: &str) -> Option<String> {
        request
            .headers
            .iter()
            .find(|(key, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, values)| {
                values
                    .iter()
                    .map(|v| v.as_str().trim())
                    .collect::<Vec<_>>()
                    .join(",")
            })
    }

    #[test]
    fn test_accept_language() {
        assert_eq!(
            accept_language("ru-RU"),
            "ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7"
        );
        assert_eq!(accept_language("en"), "en,en;q=0.9,en-US;q=0.8,en;q=0.7");
    }

    #[test]
    fn test_rendered_height() {
        let html = r#"<div class="list"><p>a</p><p>b</p></div>"#;
        assert!(rendered_height(html, ".list").unwrap() > 0);
        assert_eq!(rendered_height(html, ".missing"), None);
    }

    #[tokio::test]
    async fn test_page_goto_sends_profile_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/catalog/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let engine = HttpEngine::new(EngineKind::Firefox, &Config::default());
        let context = engine.new_context().await.unwrap();
        let mut page = context.new_page().await.unwrap();

        let url = Url::parse(&format!("{}/catalog/", server.uri())).unwrap();
        let nav = page.goto(&url).await.unwrap();

        assert_eq!(nav.status, 200);
        assert_eq!(page.content(), "<html>ok</html>");
        assert_eq!(page.current_url(), Some(&url));

        let requests = server.received_requests().await.unwrap();
        assert_eq!(
            sent_header(&requests[0], "accept-language").as_deref(),
            Some("ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7")
        );
        assert!(sent_header(&requests[0], "user-agent")
            .unwrap()
            .contains("Firefox/"));
    }

    #[tokio::test]
    async fn test_reload_without_document_fails() {
        let engine = HttpEngine::new(EngineKind::Chromium, &Config::default());
        let context = engine.new_context().await.unwrap();
        let mut page = context.new_page().await.unwrap();

        assert!(matches!(
            page.reload().await.unwrap_err(),
            EngineError::NoDocument
        ));
    }

    #[tokio::test]
    async fn test_click_reports_nothing_clicked() {
        let engine = HttpEngine::new(EngineKind::Webkit, &Config::default());
        let context = engine.new_context().await.unwrap();
        let mut page = context.new_page().await.unwrap();

        assert!(!page.click("button").await.unwrap());
    }
}
