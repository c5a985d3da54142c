//! URL handling module
//!
//! This module provides URL canonicalization (the key item links are deduplicated
//! by), relative link resolution, and pagination page numbering.

mod normalize;

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

// Re-export main functions
pub use normalize::{canonicalize, canonicalize_url};

/// Resolves an href against the page it was found on
///
/// Returns None for empty hrefs, fragment-only anchors, non-navigational schemes
/// (`javascript:`, `mailto:`, `tel:`, `data:`) and anything that does not resolve
/// to an HTTP(S) URL.
pub fn resolve_href(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

/// Returns true if both URLs point at the same host
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(x), Some(y)) => {
            x.eq_ignore_ascii_case(y) && a.port_or_known_default() == b.port_or_known_default()
        }
        _ => false,
    }
}

/// Extracts the listing page number from `page=N` or `PAGEN_k=N` query parameters
pub fn page_number(url: &Url) -> Option<u32> {
    static PAGEN: OnceLock<Regex> = OnceLock::new();
    let pagen = PAGEN.get_or_init(|| Regex::new(r"^PAGEN_\d+$").expect("static regex"));

    url.query_pairs()
        .find(|(key, _)| key == "page" || pagen.is_match(key))
        .and_then(|(_, value)| value.parse().ok())
}
