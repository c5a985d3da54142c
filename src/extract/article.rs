use super::jsonld::scalar_text;
use super::props::{find_value_by_labels, labeled_row_value};
use super::{first_resolved, Extractor, Field, ItemDocument};

/// Labels an article number is commonly shown under, most specific first
const ARTICLE_LABELS: &[&str] = &["Артикул", "Код товара", "Модель", "SKU", "Код"];

const ARTICLE_CHAIN: &[Extractor<String>] =
    &[article_from_row, article_from_site, article_from_jsonld, article_from_labels];

/// Extracts the article/SKU
pub fn extract_article(doc: &ItemDocument<'_>) -> Field<String> {
    first_resolved(doc, ARTICLE_CHAIN)
}

fn article_from_row(doc: &ItemDocument<'_>) -> Field<String> {
    Field::from_option(
        doc.selectors
            .article_row
            .as_ref()
            .and_then(|row| labeled_row_value(&doc.html, row)),
    )
}

fn article_from_site(doc: &ItemDocument<'_>) -> Field<String> {
    Field::from_option(
        doc.selectors
            .article
            .iter()
            .find_map(|selector| doc.select_text(selector)),
    )
}

fn article_from_jsonld(doc: &ItemDocument<'_>) -> Field<String> {
    Field::from_option(doc.products.iter().find_map(|product| {
        product
            .get("sku")
            .and_then(scalar_text)
            .or_else(|| product.get("mpn").and_then(scalar_text))
    }))
}

fn article_from_labels(doc: &ItemDocument<'_>) -> Field<String> {
    Field::from_option(find_value_by_labels(&doc.html, ARTICLE_LABELS))
}
