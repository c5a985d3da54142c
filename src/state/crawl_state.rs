use std::collections::{HashSet, VecDeque};
use url::Url;

/// Transient bookkeeping for one listing crawl
///
/// Pages are visited in discovery order; item links are kept in discovery order
/// and deduplicated by their canonical form.
#[derive(Debug, Default)]
pub struct CrawlState {
    visited_pages: HashSet<String>,
    pending_pages: VecDeque<Url>,
    queued_pages: HashSet<String>,
    item_keys: HashSet<String>,
    item_links: Vec<Url>,
    empty_streak: u32,
}

impl CrawlState {
    /// Creates a crawl state seeded with the entry page
    pub fn new(entry: Url) -> Self {
        let mut state = Self::default();
        state.enqueue_page(entry);
        state
    }

    /// Queues a listing page unless it was already visited or queued
    ///
    /// Returns true if the page was added.
    pub fn enqueue_page(&mut self, page: Url) -> bool {
        let key = page.as_str().to_string();
        if self.visited_pages.contains(&key) || !self.queued_pages.insert(key) {
            return false;
        }
        self.pending_pages.push_back(page);
        true
    }

    /// Pops the next unvisited page and marks it visited
    pub fn next_page(&mut self) -> Option<Url> {
        while let Some(page) = self.pending_pages.pop_front() {
            let key = page.as_str().to_string();
            self.queued_pages.remove(&key);
            if self.visited_pages.insert(key) {
                return Some(page);
            }
        }
        None
    }

    /// Records an item link; returns true if it had not been seen before
    pub fn add_item_link(&mut self, canonical: Url) -> bool {
        if self.item_keys.insert(canonical.as_str().to_string()) {
            self.item_links.push(canonical);
            true
        } else {
            false
        }
    }

    /// Updates the empty-page streak after a page yielded `added` new links
    pub fn record_page_yield(&mut self, added: usize) {
        if added == 0 {
            self.empty_streak += 1;
        } else {
            self.empty_streak = 0;
        }
    }

    pub fn empty_streak(&self) -> u32 {
        self.empty_streak
    }

    pub fn pages_visited(&self) -> usize {
        self.visited_pages.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_pages.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.item_links.len()
    }

    /// Consumes the state, returning the deduplicated item links
    pub fn into_item_links(self) -> Vec<Url> {
        self.item_links
    }
}
