//! Crawl pipeline shared by every site adapter
//!
//! This module contains the site-independent crawling logic, including:
//! - Challenge detection and retrying navigation
//! - Listing traversal with pagination and item link discovery
//! - A bounded worker pool for item extraction
//! - Engine fallback across isolated browser contexts

mod challenge;
mod diagnostics;
mod fallback;
mod orchestrator;
mod pagination;
mod pool;

pub use challenge::{classify, is_blocked, navigate_with_retries, Verdict, CHALLENGE_SIGNATURES};
pub use diagnostics::{CountMismatch, Diagnostics, EngineFailure, Extraction, ItemFailure};
pub use fallback::{run_with_fallback, ContextRun};
pub use orchestrator::{
    classify_entry, collect_item_links, discover_item_links, dismiss_consent, DeclaredTotal,
    EntryKind, ItemShape, ListingOutcome, ListingRules, EXCLUDED_FRAGMENTS,
};
pub use pagination::{declared_count, declared_goods_total, discover_pages};
pub use pool::{ItemExtractor, PoolOutcome, WorkerPool};
