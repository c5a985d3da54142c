use super::jsonld::scalar_text;
use super::{element_text, first_resolved, Extractor, Field, ItemDocument};
use regex::Regex;
use scraper::Selector;
use serde_json::Value;
use std::sync::OnceLock;

/// Generic visual price selectors, tried after the site's own
const GENERIC_PRICE_SELECTORS: &[&str] = &[
    r#"[data-qa*="price"]"#,
    ".price-current",
    ".current-price",
    ".product-price__current",
    ".product-price",
    ".price",
    ".Price__current",
    ".product__price",
    "span.price",
    "div.price",
];

const PRICE_CHAIN: &[Extractor<i64>] = &[
    price_from_jsonld,
    price_from_meta,
    price_from_selectors,
    price_from_text,
];

/// Extracts the price in whole currency units
pub fn extract_price(doc: &ItemDocument<'_>) -> Field<i64> {
    first_resolved(doc, PRICE_CHAIN)
}

/// Normalizes a price text to an integer
///
/// Takes the first numeric run, drops space and NBSP thousands separators, treats
/// the last `.` or `,` as a decimal point when one or two digits follow it (as a
/// thousands separator otherwise) and rounds half away from zero.
///
/// ```
/// use storefront_harvester::extract::parse_price;
/// use storefront_harvester::Field;
///
/// assert_eq!(parse_price("12 990,50 ₽"), Field::Resolved(12991));
/// assert_eq!(parse_price("по запросу"), Field::Unresolved);
/// ```
pub fn parse_price(text: &str) -> Field<i64> {
    static NUMERIC_RUN: OnceLock<Regex> = OnceLock::new();
    let numeric_run =
        NUMERIC_RUN.get_or_init(|| Regex::new(r"\d(?:[\d .,]*\d)?").expect("static regex"));

    let cleaned = text.replace(['\u{a0}', '\u{202f}', '\u{2009}'], " ");
    let Some(run) = numeric_run.find(&cleaned) else {
        return Field::Unresolved;
    };

    let compact: String = run.as_str().chars().filter(|c| *c != ' ').collect();
    let number = match compact.rfind(['.', ',']) {
        Some(pos) if (1..=2).contains(&(compact.len() - pos - 1)) => {
            let integer: String = compact[..pos].chars().filter(char::is_ascii_digit).collect();
            format!("{}.{}", integer, &compact[pos + 1..])
        }
        _ => compact.chars().filter(char::is_ascii_digit).collect(),
    };

    Field::from_option(number.parse::<f64>().ok().map(|value| value.round() as i64))
}

fn price_from_jsonld(doc: &ItemDocument<'_>) -> Field<i64> {
    for product in &doc.products {
        let offer_price = match product.get("offers") {
            Some(Value::Array(offers)) => offers.first().and_then(offer_price),
            Some(offer @ Value::Object(_)) => offer_price(offer),
            _ => None,
        };

        let candidate = offer_price
            .or_else(|| product.get("price").and_then(scalar_text))
            .or_else(|| {
                product
                    .get("priceSpecification")
                    .and_then(|spec| spec.get("price"))
                    .and_then(scalar_text)
            });

        if let Some(Field::Resolved(price)) = candidate.as_deref().map(parse_price) {
            return Field::Resolved(price);
        }
    }
    Field::Unresolved
}

fn offer_price(offer: &Value) -> Option<String> {
    ["price", "lowPrice", "highPrice"]
        .iter()
        .find_map(|key| offer.get(*key).and_then(scalar_text))
}

fn price_from_meta(doc: &ItemDocument<'_>) -> Field<i64> {
    for selector in [
        r#"meta[itemprop="price"][content]"#,
        r#"meta[property="product:price:amount"][content]"#,
    ] {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        let content = doc
            .html
            .select(&selector)
            .next()
            .and_then(|meta| meta.value().attr("content"));
        if let Some(Field::Resolved(price)) = content.map(parse_price) {
            return Field::Resolved(price);
        }
    }
    Field::Unresolved
}

fn price_from_selectors(doc: &ItemDocument<'_>) -> Field<i64> {
    for selector in doc.selectors.price.iter().chain(GENERIC_PRICE_SELECTORS) {
        let Ok(parsed) = Selector::parse(selector) else {
            continue;
        };
        if let Some(element) = doc.html.select(&parsed).next() {
            if let Field::Resolved(price) = parse_price(&element_text(element)) {
                return Field::Resolved(price);
            }
        }
    }
    Field::Unresolved
}

/// Last resort: the first text node with a number followed by a ruble sign
fn price_from_text(doc: &ItemDocument<'_>) -> Field<i64> {
    static PRICE_TEXT: OnceLock<Regex> = OnceLock::new();
    let price_text = PRICE_TEXT
        .get_or_init(|| Regex::new(r"(?i)\d[\d\s]{2,}.*(?:₽|руб)").expect("static regex"));

    doc.html
        .root_element()
        .text()
        .find(|text| price_text.is_match(text))
        .map(parse_price)
        .unwrap_or(Field::Unresolved)
}
