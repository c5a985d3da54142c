use crate::url::{page_number, resolve_href};
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

/// Pagination links understood on every site
const GENERIC_PAGINATION: &[&str] = &[
    r#"a[rel="next"]"#,
    r#"link[rel="next"]"#,
    r#"a[href*="PAGEN_"]"#,
    r#"a[href*="?page="]"#,
    r#"a[href*="&page="]"#,
    r#"li[data-testid="pagination-list-item"] a[href]"#,
];

/// Discovers pagination pages linked from a listing page
///
/// Follows explicit "next" links, numbered `page`/`PAGEN_*` query links and the
/// site's own paginator selectors. Results are resolved against `current`,
/// deduplicated and ordered by page number; links without a number sort as page 1.
pub fn discover_pages(html: &Html, current: &Url, site_selectors: &[&str]) -> Vec<Url> {
    let mut pages: Vec<Url> = Vec::new();

    for selector in GENERIC_PAGINATION.iter().chain(site_selectors) {
        let Ok(parsed) = Selector::parse(selector) else {
            tracing::warn!("Invalid pagination selector: {}", selector);
            continue;
        };
        for element in html.select(&parsed) {
            let Some(url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_href(href, current))
            else {
                continue;
            };
            if !pages.contains(&url) {
                pages.push(url);
            }
        }
    }

    pages.sort_by_key(|url| page_number(url).unwrap_or(1));
    pages
}

/// Reads a declared item total such as "1 234 товара" from the element matching `selector`
///
/// The last number in the element's text is used, so "Показано 24 из 311" yields 311.
pub fn declared_count(html: &Html, selector: &str) -> Option<usize> {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let number = NUMBER.get_or_init(|| Regex::new(r"\d+").expect("static regex"));

    let selector = Selector::parse(selector).ok()?;
    let text: String = html.select(&selector).next()?.text().collect();
    let compact: String = text
        .chars()
        .filter(|c| !matches!(c, '\u{a0}' | '\u{202f}'))
        .collect();

    number
        .find_iter(&compact)
        .last()
        .and_then(|m| m.as_str().parse().ok())
}

/// Finds an "N товаров" style total anywhere in the listing text
pub fn declared_goods_total(html: &Html) -> Option<usize> {
    static GOODS: OnceLock<Regex> = OnceLock::new();
    let goods = GOODS.get_or_init(|| {
        Regex::new(r"(?i)(\d[\d\u{a0} ]*)\s*товар(?:ов|а)?\b").expect("static regex")
    });

    html.root_element().text().find_map(|text| {
        goods.captures(text).and_then(|caps| {
            caps[1]
                .chars()
                .filter(char::is_ascii_digit)
                .collect::<String>()
                .parse()
                .ok()
        })
    })
}
