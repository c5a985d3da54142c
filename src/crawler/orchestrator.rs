//! Listing crawl: from an entry URL to a deduplicated set of item links
//!
//! Pages are visited breadth-first in discovery order. Each visited page
//! contributes item links (matched by the site's item shape, canonicalized and
//! deduplicated) and further pagination pages. The crawl stops when the queue
//! drains, the page cap is reached, a declared total has been collected, or a run
//! of pages has produced nothing new.

use super::challenge::{is_blocked, navigate_with_retries};
use super::diagnostics::{CountMismatch, Diagnostics};
use super::pagination::{declared_count, declared_goods_total, discover_pages};
use crate::config::Config;
use crate::engine::{document_title, has_element, Page};
use crate::state::CrawlState;
use crate::url::{canonicalize, resolve_href, same_host};
use crate::Result;
use scraper::{Html, Selector};
use url::Url;

/// Substrings that disqualify a link from being an item link
pub const EXCLUDED_FRAGMENTS: &[&str] = &["#", "/compare", "/favorites", "/filter/", "PAGEN_"];

/// Largest tolerated gap between a declared total and the discovered link count
const COUNT_TOLERANCE: usize = 2;

/// What an item link looks like on a site
#[derive(Debug, Clone, Copy)]
pub struct ItemShape {
    /// Anchors that may point at items
    pub anchors: &'static str,
    /// Path prefix of item pages, e.g. `/product/`
    pub path_prefix: &'static str,
    /// Minimum number of non-empty path segments
    pub min_segments: usize,
}

impl ItemShape {
    /// Returns true if the URL's path has the shape of an item page
    pub fn matches(&self, url: &Url) -> bool {
        let path = url.path();
        let segments = path.split('/').filter(|s| !s.is_empty()).count();
        path.starts_with(self.path_prefix) && segments >= self.min_segments
    }
}

/// Where a site states how many items a listing holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredTotal {
    Absent,
    /// An element holding the total; the crawl stops once that many links are found
    Counter(&'static str),
    /// "N товаров" text anywhere on the first page
    GoodsText,
}

/// Per-site listing behavior
#[derive(Debug, Clone, Copy)]
pub struct ListingRules {
    pub item: ItemShape,
    /// Site paginator selectors, in addition to the generic ones
    pub paginators: &'static [&'static str],
    pub declared_total: DeclaredTotal,
    /// Consent or cookie banner buttons, dismissed once on the first page
    pub consent_buttons: &'static [&'static str],
}

/// How an entry URL is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    SingleItem,
    Listing,
}

/// Classifies an entry URL by path shape
pub fn classify_entry(entry: &Url, shape: &ItemShape) -> EntryKind {
    if shape.matches(entry) {
        EntryKind::SingleItem
    } else {
        EntryKind::Listing
    }
}

/// Result of a listing crawl
#[derive(Debug, Clone)]
pub struct ListingOutcome {
    /// Canonical item links in discovery order
    pub links: Vec<Url>,
    pub pages_visited: usize,
    /// Whether the last loaded document was still a challenge
    pub blocked: bool,
    /// Title of the first listing page
    pub title: String,
    pub declared: Option<usize>,
}

/// Extracts item links from one listing page
///
/// Only links on the entry's host whose path matches `shape` are kept; links
/// containing any of `EXCLUDED_FRAGMENTS` are skipped. Results are canonical and
/// unique within the page.
pub fn collect_item_links(html: &Html, page_url: &Url, entry: &Url, shape: &ItemShape) -> Vec<Url> {
    let Ok(anchors) = Selector::parse(shape.anchors) else {
        tracing::warn!("Invalid item anchor selector: {}", shape.anchors);
        return Vec::new();
    };

    let mut links: Vec<Url> = Vec::new();
    for anchor in html.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if EXCLUDED_FRAGMENTS.iter().any(|f| href.contains(f)) {
            continue;
        }
        let Some(url) = resolve_href(href, page_url) else {
            continue;
        };
        if !same_host(&url, entry) || !shape.matches(&url) {
            continue;
        }
        if let Ok(canonical) = canonicalize(url) {
            if !links.contains(&canonical) {
                links.push(canonical);
            }
        }
    }
    links
}

/// Everything read from one listing document, parsed without holding the DOM across awaits
struct PageScan {
    items: Vec<Url>,
    pages: Vec<Url>,
    declared: Option<usize>,
}

fn scan_listing(content: &str, page_url: &Url, entry: &Url, rules: &ListingRules, first: bool) -> PageScan {
    let html = Html::parse_document(content);
    let declared = if first {
        match rules.declared_total {
            DeclaredTotal::Absent => None,
            DeclaredTotal::Counter(selector) => declared_count(&html, selector),
            DeclaredTotal::GoodsText => declared_goods_total(&html),
        }
    } else {
        None
    };

    PageScan {
        items: collect_item_links(&html, page_url, entry, &rules.item),
        pages: discover_pages(&html, page_url, rules.paginators),
        declared,
    }
}

/// Clicks the first consent button present on the page
///
/// Returns true if a banner was dismissed.
pub async fn dismiss_consent(page: &mut dyn Page, buttons: &[&str], config: &Config) -> bool {
    for selector in buttons {
        if !has_element(page.content(), selector) {
            continue;
        }
        match page.click(selector).await {
            Ok(true) => {
                tracing::debug!("Dismissed consent banner via {}", selector);
                page.wait(config.timeouts.panel_settle()).await;
                return true;
            }
            Ok(false) => {}
            Err(e) => tracing::debug!("Consent click on {} failed: {}", selector, e),
        }
    }
    false
}

/// Crawls a listing from `entry`, collecting item links
///
/// Page failures are recorded in `diagnostics` and do not stop the crawl; an
/// outcome without links is left for the caller to judge.
pub async fn discover_item_links(
    page: &mut dyn Page,
    entry: &Url,
    rules: &ListingRules,
    config: &Config,
    diagnostics: &mut Diagnostics,
) -> Result<ListingOutcome> {
    let entry = canonicalize(entry.clone())?;
    let limits = &config.harvester;
    let mut state = CrawlState::new(entry.clone());
    let mut title: Option<String> = None;
    let mut declared: Option<usize> = None;
    let mut first = true;

    while let Some(page_url) = state.next_page() {
        tracing::debug!("Visiting listing page {} ({})", page_url, state.pages_visited());

        if let Err(e) = navigate_with_retries(page, &page_url, &config.challenge).await {
            tracing::warn!("Listing page {} failed: {}", page_url, e);
            diagnostics.record_challenge(format!("{}: {}", page_url, e));
            state.record_page_yield(0);
        } else {
            if first && dismiss_consent(page, rules.consent_buttons, config).await {
                if let Err(e) = page.reload().await {
                    tracing::debug!("Reload after consent failed: {}", e);
                }
            }
            if title.is_none() {
                title = document_title(page.content());
            }

            let scan = scan_listing(page.content(), &page_url, &entry, rules, first);
            first = false;
            if let Some(total) = scan.declared {
                tracing::info!("Listing declares {} items", total);
                declared = Some(total);
            }

            let mut added = 0;
            for link in scan.items {
                if state.add_item_link(link) {
                    added += 1;
                }
            }
            state.record_page_yield(added);
            tracing::debug!("{} new item links on {} ({} total)", added, page_url, state.item_count());

            for next in scan.pages {
                if !same_host(&next, &entry) {
                    continue;
                }
                if let Ok(next) = canonicalize(next) {
                    state.enqueue_page(next);
                }
            }
        }

        if state.pages_visited() >= limits.max_listing_pages as usize {
            tracing::info!("Listing page cap of {} reached", limits.max_listing_pages);
            break;
        }
        if let (DeclaredTotal::Counter(_), Some(total)) = (rules.declared_total, declared) {
            if total > 0 && state.item_count() >= total {
                tracing::debug!("Collected all {} declared items", total);
                break;
            }
        }
        if state.empty_streak() >= limits.empty_page_streak
            && state.pages_visited() > limits.min_pages_before_stop as usize
        {
            tracing::debug!("{} empty pages in a row, stopping", state.empty_streak());
            break;
        }
        if state.has_pending() {
            page.wait(limits.page_delay()).await;
        }
    }

    let pages_visited = state.pages_visited();
    let links = state.into_item_links();

    if let Some(total) = declared {
        if total.abs_diff(links.len()) > COUNT_TOLERANCE {
            tracing::warn!("Declared {} items but found {} links", total, links.len());
            diagnostics.count_mismatch = Some(CountMismatch {
                declared: total,
                discovered: links.len(),
            });
        }
    }

    Ok(ListingOutcome {
        pages_visited,
        blocked: is_blocked(page.content()),
        title: title.unwrap_or_default(),
        declared,
        links,
    })
}
