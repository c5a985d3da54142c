//! Лемана ПРО
//!
//! Listings paginate with `?page=N`. Item pages only show per-store stock inside a
//! drawer, so stock comes from the availability panel with the visible label as a
//! fallback. The site is guarded by an anti-bot layer, so extraction falls back
//! across all configured engines.

use super::profile::SiteProfile;
use crate::crawler::{DeclaredTotal, ItemShape, ListingRules};
use crate::extract::{FieldSelectors, LabelRule, StockPanel};

pub const PROFILE: SiteProfile = SiteProfile {
    key: "lemanapro",
    display_name: "Лемана ПРО",
    listing: ListingRules {
        item: ItemShape {
            anchors: r#"a[href*="/product/"]"#,
            path_prefix: "/product/",
            min_segments: 2,
        },
        paginators: &[],
        declared_total: DeclaredTotal::Absent,
        consent_buttons: &[
            r#"[data-qa="cookie-accept-button"]"#,
            r#"button[data-qa*="accept"]"#,
        ],
    },
    fields: FieldSelectors {
        name: &[r#"h1[data-qa="product-title"]"#],
        price: &[
            r#"[data-qa="product-price"] [data-qa*="primary-price"]"#,
            r#"[data-qa="product-price"]"#,
        ],
        article: &[r#"[data-qa="product-article"]"#],
        article_row: None,
        stock_labels: &[LabelRule {
            selector: r#"[data-qa="title-interactive-stocks-text"], [data-qa*="stocks-text"]"#,
            contains: None,
        }],
        attribute_blocks: &[],
    },
    stock_panel: Some(STOCK_PANEL),
    expanders: &[
        r#"button[data-qa="product-characteristics-button"]"#,
        r#"button[data-qa*="all-characteristics"]"#,
    ],
    engine_fallback: true,
};

const STOCK_PANEL: StockPanel = StockPanel {
    triggers: &[
        r#"button[data-qa="title-interactive-button"]"#,
        r#"[data-qa="title-interactive-button"]"#,
        r#"[data-qa="title-interactive-stocks-text"]"#,
        r#"[data-qa*="stocks-text"]"#,
    ],
    panel: r#"[data-qa="stocks-in-stores-modal"]"#,
    scroll_container: Some(r#"[data-qa="stocks-in-stores-modal"] [data-testid="drawer-content"]"#),
    items: r#"[data-qa="modal-store-item-in-stock-text"]"#,
    close: &[
        r#"[data-testid="drawer-header-back"]"#,
        r#"[data-qa="stocks-in-stores-modal"] button[aria-label="назад"]"#,
    ],
};
