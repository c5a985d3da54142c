//! Field extraction from product pages
//!
//! Extractors are pure functions over one parsed snapshot of an item page. Each
//! field is produced by a fallback chain: an ordered slice of extractor functions,
//! where the first resolved candidate wins.
//!
//! - `price`: price chain and the shared price normalizer
//! - `article`: article/SKU chain
//! - `stock`: availability panel and label strategies
//! - `props`: page key/value collection and structural labeled search
//! - `attributes`: caller-chosen attribute resolution (tx1/tx2)
//! - `jsonld`: JSON-LD Product nodes

mod article;
mod attributes;
mod jsonld;
mod price;
mod props;
mod stock;

pub use article::extract_article;
pub use attributes::{expand_aliases, resolve_attribute};
pub use jsonld::product_nodes;
pub use price::{extract_price, parse_price};
pub use props::{collect_props, find_value_by_labels, PropertyMap};
pub use stock::{read_stock_panel, stock_from_label, sum_stock_units, StockPanel};

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;
use url::Url;

/// Display value for any field that could not be resolved
pub const UNKNOWN: &str = "unknown";

/// Outcome of extracting one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Resolved(T),
    Unresolved,
}

impl<T> Field<T> {
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Field::Resolved(v),
            None => Field::Unresolved,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Field::Resolved(_))
    }

    pub fn resolved(self) -> Option<T> {
        match self {
            Field::Resolved(v) => Some(v),
            Field::Unresolved => None,
        }
    }

    /// Returns self if resolved, otherwise evaluates the next candidate
    pub fn or_else(self, next: impl FnOnce() -> Field<T>) -> Field<T> {
        match self {
            Field::Resolved(v) => Field::Resolved(v),
            Field::Unresolved => next(),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Resolved(v) => write!(f, "{}", v),
            Field::Unresolved => write!(f, "{}", UNKNOWN),
        }
    }
}

/// One extracted product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRecord {
    pub url: String,
    pub article: Field<String>,
    pub name: Field<String>,
    pub price: Field<i64>,
    pub stock: Field<i64>,
    pub tx1: Field<String>,
    pub tx2: Field<String>,
}

/// Display-ready form of a record, with the sentinel in place of unresolved fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordRow {
    pub url: String,
    pub article: String,
    pub name: String,
    pub price: String,
    pub stock: String,
    pub tx1: String,
    pub tx2: String,
}

impl ExtractedRecord {
    pub fn to_row(&self) -> RecordRow {
        RecordRow {
            url: self.url.clone(),
            article: self.article.to_string(),
            name: self.name.to_string(),
            price: self.price.to_string(),
            stock: self.stock.to_string(),
            tx1: self.tx1.to_string(),
            tx2: self.tx2.to_string(),
        }
    }
}

/// Key/value rows inside a site-specific attribute container
#[derive(Debug, Clone, Copy)]
pub struct AttributeBlock {
    /// Selector for one attribute row
    pub row: &'static str,
    /// Selector for the label inside the row
    pub key: &'static str,
    /// Selector for value candidates; the first whose text differs from the label wins
    pub value: &'static str,
}

/// Attribute row picked out by its label, e.g. the "Артикул" row of a property list
#[derive(Debug, Clone, Copy)]
pub struct LabeledRow {
    pub block: AttributeBlock,
    /// Matched case-insensitively as a substring of the row's label
    pub label: &'static str,
}

/// Visible availability label, optionally required to contain a marker
#[derive(Debug, Clone, Copy)]
pub struct LabelRule {
    pub selector: &'static str,
    pub contains: Option<&'static str>,
}

/// Site-specific selectors consulted before the generic fallbacks
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldSelectors {
    pub name: &'static [&'static str],
    pub price: &'static [&'static str],
    pub article: &'static [&'static str],
    /// Attribute row read before the `article` selectors
    pub article_row: Option<LabeledRow>,
    pub stock_labels: &'static [LabelRule],
    pub attribute_blocks: &'static [AttributeBlock],
}

/// One parsed item page
pub struct ItemDocument<'a> {
    pub html: Html,
    pub products: Vec<Value>,
    pub selectors: &'a FieldSelectors,
}

impl<'a> ItemDocument<'a> {
    pub fn parse(content: &str, selectors: &'a FieldSelectors) -> Self {
        let html = Html::parse_document(content);
        let products = product_nodes(&html);
        Self {
            html,
            products,
            selectors,
        }
    }

    /// Text of the first element matching `selector`, if it has any
    pub fn select_text(&self, selector: &str) -> Option<String> {
        select_text(&self.html, selector)
    }
}

/// An extractor in a fallback chain
pub type Extractor<T> = fn(&ItemDocument<'_>) -> Field<T>;

/// Runs a fallback chain, returning the first resolved candidate
pub fn first_resolved<T>(doc: &ItemDocument<'_>, chain: &[Extractor<T>]) -> Field<T> {
    for extractor in chain {
        if let Field::Resolved(value) = extractor(doc) {
            return Field::Resolved(value);
        }
    }
    Field::Unresolved
}

const GENERIC_NAME_SELECTORS: &str = "h1, .product-title, .ProductTitle, .card-title";

const NAME_CHAIN: &[Extractor<String>] = &[name_from_site, name_from_generic, name_from_jsonld];

fn name_from_site(doc: &ItemDocument<'_>) -> Field<String> {
    Field::from_option(
        doc.selectors
            .name
            .iter()
            .find_map(|selector| doc.select_text(selector)),
    )
}

fn name_from_generic(doc: &ItemDocument<'_>) -> Field<String> {
    Field::from_option(doc.select_text(GENERIC_NAME_SELECTORS))
}

fn name_from_jsonld(doc: &ItemDocument<'_>) -> Field<String> {
    Field::from_option(doc.products.iter().find_map(|product| {
        product
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }))
}

/// Extracts the display name
pub fn extract_name(doc: &ItemDocument<'_>) -> Field<String> {
    first_resolved(doc, NAME_CHAIN)
}

/// Extracts every field of an item page
///
/// `panel_stock` is the result of the availability panel, if the site reads one;
/// when it is unresolved the visible label is used instead.
pub fn extract_record(
    content: &str,
    url: &Url,
    selectors: &FieldSelectors,
    tx1: &str,
    tx2: &str,
    panel_stock: Field<i64>,
) -> ExtractedRecord {
    let doc = ItemDocument::parse(content, selectors);
    let props = collect_props(&doc);

    ExtractedRecord {
        url: url.to_string(),
        article: extract_article(&doc),
        name: extract_name(&doc),
        price: extract_price(&doc),
        stock: panel_stock.or_else(|| stock_from_label(&doc)),
        tx1: resolve_attribute(&props, &doc.html, tx1),
        tx2: resolve_attribute(&props, &doc.html, tx2),
    }
}

/// Normalizes a label for comparison: lower-case with non-word characters removed
pub fn normalize_label(text: &str) -> String {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    let non_word = NON_WORD.get_or_init(|| Regex::new(r"\W+").expect("static regex"));
    non_word.replace_all(&text.to_lowercase(), "").into_owned()
}

/// Whitespace-collapsed text content of an element
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn select_text(html: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    html.select(&selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}
