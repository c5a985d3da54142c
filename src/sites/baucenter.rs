//! Бауцентр
//!
//! Listings state their size as "N товаров"; the discovered link count is checked
//! against it. Attributes live in styled `ProductCardProperty` rows.

use super::profile::SiteProfile;
use crate::crawler::{DeclaredTotal, ItemShape, ListingRules};
use crate::extract::{AttributeBlock, FieldSelectors, LabelRule};

pub const PROFILE: SiteProfile = SiteProfile {
    key: "baucenter",
    display_name: "Бауцентр",
    listing: ListingRules {
        item: ItemShape {
            anchors: r#"[data-product-card-id] a[href^="/product/"]"#,
            path_prefix: "/product/",
            min_segments: 2,
        },
        paginators: &[],
        declared_total: DeclaredTotal::GoodsText,
        consent_buttons: &[r#"[data-testid="city-confirm-yes"]"#],
    },
    fields: FieldSelectors {
        name: &["h1"],
        price: &[r#"span[class*="MainPrice"]"#],
        article: &[r#"span[class*="CopiedTypography"] span"#],
        article_row: None,
        stock_labels: &[LabelRule {
            selector: r#"ul[class*="AvailabilitiesList"] p"#,
            contains: Some("шт"),
        }],
        attribute_blocks: &[AttributeBlock {
            row: r#"div[class^="styled__ProductCardProperty-sc-"]"#,
            key: "span",
            value: r#"a, p, div[class*="ProductCardPropertyValue"], span"#,
        }],
    },
    stock_panel: None,
    expanders: &[],
    engine_fallback: false,
};
