//! State module for tracking job progress
//!
//! # Components
//!
//! - `JobStatus`: lifecycle of a scrape job (pending, running, done, error)
//! - `CrawlState`: per-job listing crawl bookkeeping (visited pages, queue, item links)

mod crawl_state;
mod job_status;

// Re-export main types
pub use crawl_state::CrawlState;
pub use job_status::JobStatus;
