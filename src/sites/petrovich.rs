//! Петрович
//!
//! Everything is marked with `data-test` attributes. Listings paginate through
//! paginator buttons and show a product counter, so the crawl stops as soon as the
//! declared number of links has been collected.

use super::profile::SiteProfile;
use crate::crawler::{DeclaredTotal, ItemShape, ListingRules};
use crate::extract::{AttributeBlock, FieldSelectors, LabelRule, LabeledRow};

/// Rows of the product property list
const PROPERTIES: AttributeBlock = AttributeBlock {
    row: "ul.product-properties-list li.data-item",
    key: ".title",
    value: ".value",
};

pub const PROFILE: SiteProfile = SiteProfile {
    key: "petrovich",
    display_name: "Петрович",
    listing: ListingRules {
        item: ItemShape {
            anchors: r#"a[data-test="product-link"]"#,
            path_prefix: "/catalog/",
            min_segments: 3,
        },
        paginators: &[r#"[data-test="paginator-page-btn"]"#],
        declared_total: DeclaredTotal::Counter(r#"[data-test="products-counter"]"#),
        consent_buttons: &[r#"[data-test="cookie-agree"]"#],
    },
    fields: FieldSelectors {
        name: &[r#"h1[data-test="product-title"]"#],
        price: &[r#"p[data-test="product-gold-price"]"#],
        article: &[
            r#"[data-test="product-code"]"#,
            r#"[data-test="product-sku"]"#,
            r#"[itemprop="sku"]"#,
        ],
        article_row: Some(LabeledRow {
            block: PROPERTIES,
            label: "Артикул",
        }),
        stock_labels: &[LabelRule {
            selector: "ul.product-properties-list li.data-item",
            contains: Some("налич"),
        }],
        attribute_blocks: &[PROPERTIES],
    },
    stock_panel: None,
    expanders: &[],
    engine_fallback: false,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{
        classify_entry, collect_item_links, declared_count, discover_pages, EntryKind,
    };
    use crate::extract::{extract_record, Field};
    use scraper::Html;
    use url::Url;

    const LISTING: &str = r#"<html><body>
        <span data-test="products-counter">2 товара</span>
        <div data-item-code="101"><a data-test="product-link" href="/catalog/1234/101/">Перфоратор</a></div>
        <div data-item-code="102"><a data-test="product-link" href="/catalog/1234/102/">Дрель</a></div>
        <a data-test="paginator-page-btn" href="/catalog/1234/?p=1">2</a>
        </body></html>"#;

    const ITEM_PAGE: &str = r#"<html><body>
        <h1 data-test="product-title">Перфоратор Makita HR2470</h1>
        <p data-test="product-gold-price">9 890 ₽</p>
        <span data-test="product-code">101</span>
        <ul class="product-properties-list">
          <li class="data-item"><span class="title">Мощность</span><span class="value">780 Вт</span></li>
          <li class="data-item"><span class="title">Частота вращения</span><span class="value">1100 об/мин</span></li>
          <li class="data-item"><span class="title">Наличие</span><span class="value">42 шт</span></li>
          <li class="data-item"><span class="title">Артикул</span><span class="value">613205</span></li>
        </ul>
        </body></html>"#;

    #[test]
    fn test_listing() {
        let entry = Url::parse("https://petrovich.ru/catalog/1234/").unwrap();
        let html = Html::parse_document(LISTING);

        assert_eq!(
            classify_entry(&entry, &PROFILE.listing.item),
            EntryKind::Listing
        );
        assert_eq!(
            collect_item_links(&html, &entry, &entry, &PROFILE.listing.item).len(),
            2
        );
        assert_eq!(
            discover_pages(&html, &entry, PROFILE.listing.paginators).len(),
            1
        );
        assert_eq!(
            declared_count(&html, r#"[data-test="products-counter"]"#),
            Some(2)
        );
    }

    #[test]
    fn test_item_fields() {
        let url = Url::parse("https://petrovich.ru/catalog/1234/101/").unwrap();
        let record = extract_record(
            ITEM_PAGE,
            &url,
            &PROFILE.fields,
            "Обороты, об/мин",
            "Вес",
            Field::Unresolved,
        );

        assert_eq!(
            record.name,
            Field::Resolved("Перфоратор Makita HR2470".to_string())
        );
        assert_eq!(record.price, Field::Resolved(9890));
        // The property row wins over the product code badge
        assert_eq!(record.article, Field::Resolved("613205".to_string()));
        assert_eq!(record.stock, Field::Resolved(42));
        assert_eq!(record.tx1, Field::Resolved("1100 об/мин".to_string()));
        assert_eq!(record.tx2, Field::Unresolved);
    }

    #[test]
    fn test_article_falls_back_to_product_code() {
        let url = Url::parse("https://petrovich.ru/catalog/1234/101/").unwrap();
        let html = r#"<h1 data-test="product-title">Дрель</h1><span data-test="product-code">101</span>"#;
        let record = extract_record(html, &url, &PROFILE.fields, "", "", Field::Unresolved);
        assert_eq!(record.article, Field::Resolved("101".to_string()));
    }
}
