use crate::crawler::ListingRules;
use crate::extract::{FieldSelectors, StockPanel};

/// Everything that distinguishes one retailer from another
///
/// Profiles are plain data; `CatalogAdapter` turns a profile into a full pipeline.
#[derive(Debug, Clone, Copy)]
pub struct SiteProfile {
    /// Capability key used to select the adapter
    pub key: &'static str,
    pub display_name: &'static str,
    pub listing: ListingRules,
    pub fields: FieldSelectors,
    /// Per-store availability panel, for sites that only show totals there
    pub stock_panel: Option<StockPanel>,
    /// Buttons revealing collapsed characteristics on item pages
    pub expanders: &'static [&'static str],
    /// Whether a failed extraction is retried under the remaining engines
    pub engine_fallback: bool,
}
