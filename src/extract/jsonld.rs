use scraper::{Html, Selector};
use serde_json::Value;

/// Collects JSON-LD nodes typed `Product`, including those nested in `@graph`
///
/// Scripts that fail to parse are skipped.
pub fn product_nodes(html: &Html) -> Vec<Value> {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };

    let mut products = Vec::new();
    for script in html.select(&selector) {
        let raw: String = script.text().collect();
        let Ok(data) = serde_json::from_str::<Value>(raw.trim()) else {
            tracing::trace!("Skipping unparsable JSON-LD block");
            continue;
        };

        let nodes = match data {
            Value::Array(items) => items,
            other => vec![other],
        };

        for node in nodes {
            if let Some(Value::Array(graph)) = node.get("@graph") {
                products.extend(graph.iter().filter(|g| is_product(g)).cloned());
            }
            if is_product(&node) {
                products.push(node);
            }
        }
    }
    products
}

fn is_product(node: &Value) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t == "Product",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("Product")),
        _ => false,
    }
}

/// Renders a string or number as trimmed text; anything else yields None
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Some(text).filter(|s| !s.is_empty())
}
