use super::{element_text, Field, ItemDocument};
use crate::engine::{has_element, Page};
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use std::time::Duration;

/// Scroll rounds before giving up on the panel height settling
const MAX_SCROLL_ROUNDS: usize = 20;

/// Selectors for a per-store availability panel
#[derive(Debug, Clone, Copy)]
pub struct StockPanel {
    /// Elements that open the panel, tried in order
    pub triggers: &'static [&'static str],
    /// The panel itself
    pub panel: &'static str,
    /// Scrollable list inside the panel, if it has one
    pub scroll_container: Option<&'static str>,
    /// Per-store availability rows
    pub items: &'static str,
    /// Buttons that close the panel
    pub close: &'static [&'static str],
}

fn units_pattern() -> &'static Regex {
    static UNITS: OnceLock<Regex> = OnceLock::new();
    UNITS.get_or_init(|| Regex::new(r"(?i)(\d+)\s*(?:шт|штук)").expect("static regex"))
}

/// Opens the availability panel, scrolls it to the end and sums the units of every store
///
/// Returns `Unresolved` if the panel cannot be opened or the page fails while it is
/// being read.
pub async fn read_stock_panel(
    page: &mut dyn Page,
    panel: &StockPanel,
    settle: Duration,
) -> Field<i64> {
    match drive_panel(page, panel, settle).await {
        Ok(stock) => stock,
        Err(e) => {
            tracing::debug!("Stock panel failed: {}", e);
            Field::Unresolved
        }
    }
}

async fn drive_panel(
    page: &mut dyn Page,
    panel: &StockPanel,
    settle: Duration,
) -> Result<Field<i64>, crate::engine::EngineError> {
    if !open_panel(page, panel, settle).await? {
        return Ok(Field::Unresolved);
    }

    let container = match panel.scroll_container {
        Some(selector) if has_element(page.content(), selector) => selector,
        _ => panel.panel,
    };

    let mut last_height = None;
    for _ in 0..MAX_SCROLL_ROUNDS {
        let height = page.scroll_to_end(container).await?;
        page.wait(settle).await;
        if height == last_height {
            break;
        }
        last_height = height;
    }

    let total = sum_stock_units(page.content(), panel);
    if total.is_none() {
        tracing::debug!("Stock panel opened without store rows");
    }

    for selector in panel.close {
        if page.click(selector).await? {
            break;
        }
    }

    Ok(Field::from_option(total))
}

async fn open_panel(
    page: &mut dyn Page,
    panel: &StockPanel,
    settle: Duration,
) -> Result<bool, crate::engine::EngineError> {
    if has_element(page.content(), panel.panel) {
        return Ok(true);
    }

    for trigger in panel.triggers {
        if !has_element(page.content(), trigger) {
            continue;
        }
        if page.click(trigger).await? {
            page.wait(settle).await;
            if has_element(page.content(), panel.panel) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Sums every `N шт` / `N штук` figure across the panel's store rows
///
/// `items` is matched inside `panel`. Returns None when the panel has no store
/// rows; rows without a figure ("Нет в наличии") count as zero.
pub fn sum_stock_units(content: &str, panel: &StockPanel) -> Option<i64> {
    let html = Html::parse_document(content);
    let items = Selector::parse(&format!("{} {}", panel.panel, panel.items)).ok()?;

    let mut rows = 0;
    let mut total = 0;
    for item in html.select(&items) {
        rows += 1;
        if let Some(units) = units_in(&element_text(item)) {
            total += units;
        }
    }
    (rows > 0).then_some(total)
}

fn units_in(text: &str) -> Option<i64> {
    units_pattern()
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Reads the site's visible availability label
///
/// Only an `N шт` / `N штук` figure counts; other numbers in a label ("в 3
/// магазинах") are not unit counts. Markers are lower-case and matched
/// case-insensitively.
pub fn stock_from_label(doc: &ItemDocument<'_>) -> Field<i64> {
    for rule in doc.selectors.stock_labels {
        let Ok(selector) = Selector::parse(rule.selector) else {
            continue;
        };
        let stock = doc
            .html
            .select(&selector)
            .map(element_text)
            .filter(|text| {
                rule.contains
                    .map_or(true, |marker| text.to_lowercase().contains(marker))
            })
            .find_map(|text| units_in(&text));
        if let Some(stock) = stock {
            return Field::Resolved(stock);
        }
    }
    Field::Unresolved
}
