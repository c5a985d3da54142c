//! Page key/value collection
//!
//! Product pages show technical attributes in many shapes. `collect_props` walks
//! them once per page, in a fixed source order:
//!
//! 1. JSON-LD `additionalProperty`
//! 2. Microdata `PropertyValue`
//! 3. `data-qa` name/value pairs
//! 4. Table rows
//! 5. Definition lists
//! 6. Site attribute containers
//! 7. Two-column rows and `label: value` lines
//!
//! Keys are normalized labels. Earlier sources win on conflicts.

use super::jsonld::scalar_text;
use super::{element_text, normalize_label, AttributeBlock, ItemDocument, LabeledRow};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// Ordered map from normalized label to value
#[derive(Debug, Clone, Default)]
pub struct PropertyMap {
    entries: Vec<(String, String)>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a label/value pair unless the normalized label is already present
    ///
    /// Returns true if the pair was added.
    pub fn insert(&mut self, label: &str, value: &str) -> bool {
        let key = normalize_label(label);
        let value = value.trim();
        if key.is_empty() || value.is_empty() || self.get(&key).is_some() {
            return false;
        }
        self.entries.push((key, value.to_string()));
        true
    }

    /// Looks up a value by normalized key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Containers that commonly hold specification rows
const SPEC_CONTAINERS: &str = ".characteristics, .props, .product-props, .product-attrs, .char, \
     .chars, .properties, .product-properties, .product__chars, .product-specs";

const DATA_QA_NAMES: &str = r#"[data-qa*="char"][data-qa*="name"], [data-qa*="spec"][data-qa*="name"], [data-qa*="param"][data-qa*="name"], [data-qa*="character"][data-qa*="name"]"#;

/// Collects every key/value pair on the page
pub fn collect_props(doc: &ItemDocument<'_>) -> PropertyMap {
    let mut props = PropertyMap::new();

    collect_jsonld(doc, &mut props);
    collect_microdata(&doc.html, &mut props);
    collect_data_qa(&doc.html, &mut props);
    collect_tables(&doc.html, &mut props);
    collect_definition_lists(&doc.html, &mut props);
    collect_site_blocks(doc, &mut props);
    collect_loose_rows(&doc.html, &mut props);

    tracing::trace!("Collected {} properties", props.len());
    props
}

fn collect_jsonld(doc: &ItemDocument<'_>, props: &mut PropertyMap) {
    for product in &doc.products {
        let Some(list) = product
            .get("additionalProperty")
            .or_else(|| product.get("additionalProperties"))
            .and_then(|v| v.as_array())
        else {
            continue;
        };

        for item in list {
            let key = ["name", "propertyID"]
                .iter()
                .find_map(|k| item.get(*k).and_then(scalar_text));
            let value = ["value", "valueReference", "propertyValue"]
                .iter()
                .find_map(|k| item.get(*k).and_then(scalar_text));
            if let (Some(key), Some(value)) = (key, value) {
                props.insert(&key, &value);
            }
        }
    }
}

fn collect_microdata(html: &Html, props: &mut PropertyMap) {
    let (Ok(block), Ok(name), Ok(value)) = (
        Selector::parse(r#"[itemprop="additionalProperty"], [itemtype*="PropertyValue"]"#),
        Selector::parse(r#"[itemprop="name"]"#),
        Selector::parse(r#"[itemprop="value"]"#),
    ) else {
        return;
    };

    for pv in html.select(&block) {
        let key = pv.select(&name).next().map(element_text);
        let val = pv.select(&value).next().map(|el| {
            let text = element_text(el);
            if text.is_empty() {
                el.value().attr("content").unwrap_or_default().to_string()
            } else {
                text
            }
        });
        if let (Some(key), Some(val)) = (key, val) {
            props.insert(&key, &val);
        }
    }
}

fn collect_data_qa(html: &Html, props: &mut PropertyMap) {
    let (Ok(names), Ok(value_sel)) = (
        Selector::parse(DATA_QA_NAMES),
        Selector::parse(r#"[data-qa*="value"]"#),
    ) else {
        return;
    };

    for name_el in html.select(&names) {
        let key = element_text(name_el);
        if key.is_empty() {
            continue;
        }
        let Some(row) = name_el.parent().and_then(ElementRef::wrap) else {
            continue;
        };

        let value = row.select(&value_sel).next().map(element_text).or_else(|| {
            let key_norm = normalize_label(&key);
            child_elements(row, &["span", "div"])
                .filter(|child| child.id() != name_el.id())
                .map(element_text)
                .find(|text| !text.is_empty() && normalize_label(text) != key_norm)
        });

        if let Some(value) = value {
            props.insert(&key, &value);
        }
    }
}

fn collect_tables(html: &Html, props: &mut PropertyMap) {
    let Ok(rows) = Selector::parse("table tr") else {
        return;
    };
    for row in html.select(&rows) {
        let cells: Vec<String> = child_elements(row, &["th", "td"]).map(element_text).collect();
        if cells.len() >= 2 {
            props.insert(&cells[0], &cells[1]);
        }
    }
}

fn collect_definition_lists(html: &Html, props: &mut PropertyMap) {
    let Ok(terms) = Selector::parse("dl dt") else {
        return;
    };
    for dt in html.select(&terms) {
        if let Some(dd) = next_definition(dt) {
            props.insert(&element_text(dt), &element_text(dd));
        }
    }
}

fn collect_site_blocks(doc: &ItemDocument<'_>, props: &mut PropertyMap) {
    for block in doc.selectors.attribute_blocks {
        for (key, value) in block_rows(&doc.html, block) {
            props.insert(&key, &value);
        }
    }
}

/// Label and value of every row of a site attribute container
fn block_rows(html: &Html, block: &AttributeBlock) -> Vec<(String, String)> {
    let (Ok(row_sel), Ok(key_sel), Ok(value_sel)) = (
        Selector::parse(block.row),
        Selector::parse(block.key),
        Selector::parse(block.value),
    ) else {
        tracing::warn!("Invalid attribute block selector: {}", block.row);
        return Vec::new();
    };

    html.select(&row_sel)
        .filter_map(|row| {
            let key = row.select(&key_sel).next().map(element_text)?;
            let value = row
                .select(&value_sel)
                .map(element_text)
                .find(|text| !text.is_empty() && *text != key)?;
            Some((key, value))
        })
        .collect()
}

/// Value of the first attribute row whose label contains `row.label`
pub fn labeled_row_value(html: &Html, row: &LabeledRow) -> Option<String> {
    let label = row.label.to_lowercase();
    block_rows(html, &row.block)
        .into_iter()
        .find(|(key, _)| key.to_lowercase().contains(&label))
        .map(|(_, value)| value)
}

fn collect_loose_rows(html: &Html, props: &mut PropertyMap) {
    static KEY_VALUE: OnceLock<Regex> = OnceLock::new();
    let key_value = KEY_VALUE.get_or_init(|| {
        Regex::new(r"^\s*([^:–—-]{2,60})\s*[:–—-]\s*(.{1,160})").expect("static regex")
    });

    let Ok(rows) = Selector::parse("li, p, div") else {
        return;
    };

    for row in html.select(&rows) {
        let children: Vec<ElementRef<'_>> = child_elements(row, &["div", "span"]).collect();
        if children.len() == 2 {
            let key = element_text(children[0]);
            let value = element_text(children[1]);
            if !key.is_empty()
                && !value.is_empty()
                && key.chars().count() <= 60
                && value.chars().count() <= 200
            {
                props.insert(&key, &value);
                continue;
            }
        }

        if has_block_children(row) {
            continue;
        }
        let text = element_text(row);
        let len = text.chars().count();
        if !(5..=220).contains(&len) || !text.contains([':', '—', '-']) {
            continue;
        }
        if let Some(caps) = key_value.captures(&text) {
            props.insert(caps[1].trim(), caps[2].trim());
        }
    }
}

/// Finds a value shown next to any of `labels`, searching the page structure
///
/// Labels match a key when either normalized form contains the other. Sources are
/// searched in order: table rows, definition lists, specification containers, then
/// `Label: value` patterns in the page text.
pub fn find_value_by_labels<S: AsRef<str>>(html: &Html, labels: &[S]) -> Option<String> {
    let normalized: Vec<String> = labels
        .iter()
        .map(|l| normalize_label(l.as_ref()))
        .filter(|l| !l.is_empty())
        .collect();
    if normalized.is_empty() {
        return None;
    }

    let matches_key = |key: &str| {
        let key = normalize_label(key);
        !key.is_empty()
            && normalized
                .iter()
                .any(|label| key.contains(label.as_str()) || label.contains(key.as_str()))
    };

    labeled_table_value(html, &matches_key)
        .or_else(|| labeled_definition_value(html, &matches_key))
        .or_else(|| labeled_container_value(html, &matches_key))
        .or_else(|| labeled_text_value(html, labels))
        .filter(|value| !value.is_empty())
}

fn labeled_table_value(html: &Html, matches_key: &dyn Fn(&str) -> bool) -> Option<String> {
    let rows = Selector::parse("table tr").ok()?;
    html.select(&rows).find_map(|row| {
        let cells: Vec<ElementRef<'_>> = child_elements(row, &["th", "td"]).collect();
        (cells.len() >= 2 && matches_key(&element_text(cells[0]))).then(|| element_text(cells[1]))
    })
}

fn labeled_definition_value(html: &Html, matches_key: &dyn Fn(&str) -> bool) -> Option<String> {
    let terms = Selector::parse("dl dt").ok()?;
    html.select(&terms)
        .filter(|dt| matches_key(&element_text(*dt)))
        .find_map(next_definition)
        .map(element_text)
}

fn labeled_container_value(html: &Html, matches_key: &dyn Fn(&str) -> bool) -> Option<String> {
    let containers = Selector::parse(SPEC_CONTAINERS).ok()?;
    let rows = Selector::parse("div, li, p").ok()?;
    let spans = Selector::parse("span").ok()?;
    let emphasis = Selector::parse("b, strong").ok()?;

    for container in html.select(&containers) {
        for row in container.select(&rows) {
            let row_spans: Vec<ElementRef<'_>> = row.select(&spans).take(2).collect();
            if row_spans.len() == 2 {
                if matches_key(&element_text(row_spans[0])) {
                    return Some(element_text(row_spans[1]));
                }
                continue;
            }

            if let Some(key_el) = row.select(&emphasis).next() {
                let key = element_text(key_el);
                if matches_key(&key) {
                    let rest = element_text(row).replacen(&key, "", 1);
                    return Some(rest.trim().trim_start_matches([':', '-', '–']).trim().to_string());
                }
            }
        }
    }
    None
}

fn labeled_text_value<S: AsRef<str>>(html: &Html, labels: &[S]) -> Option<String> {
    static PARENTHETICAL: OnceLock<Regex> = OnceLock::new();
    let parenthetical =
        PARENTHETICAL.get_or_init(|| Regex::new(r"\s*\(.*?\)\s*").expect("static regex"));

    let text = html
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    labels.iter().find_map(|label| {
        let label = parenthetical.replace_all(label.as_ref(), "");
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        let pattern = format!(r"(?i){}\s*[:\-–]\s*([^\n\r;|]+)", regex::escape(label));
        let re = Regex::new(&pattern).ok()?;
        re.captures(&text).map(|caps| caps[1].trim().to_string())
    })
}

/// Wrappers are skipped so that only the innermost rows have their text read
fn has_block_children(row: ElementRef<'_>) -> bool {
    const BLOCKS: &[&str] = &["div", "p", "li", "ul", "ol", "dl", "table", "section"];
    row.children()
        .filter_map(ElementRef::wrap)
        .any(|child| BLOCKS.contains(&child.value().name()))
}

fn child_elements<'a>(
    parent: ElementRef<'a>,
    names: &'a [&'a str],
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| names.contains(&child.value().name()))
}

fn next_definition(dt: ElementRef<'_>) -> Option<ElementRef<'_>> {
    dt.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == "dd")
}
