//! Crawl session state: the breadth-first link frontier
//!
//! A `CrawlSession` is a plain value owned by the crawl loop that created it,
//! never shared or static, so concurrent crawls cannot interfere. It tracks
//! the visited set and the FIFO queue, and enforces the page budget: at most
//! `page_budget` URLs are ever handed out for fetching.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Frontier lifecycle: `Active` while the queue holds work under budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontierState {
    Active,
    Done,
}

#[derive(Debug)]
pub struct CrawlSession {
    base_domain: String,
    page_budget: usize,
    visited: HashSet<String>,
    queued: HashSet<String>,
    queue: VecDeque<String>,
}

impl CrawlSession {
    /// Start a session at `seed`. The seed's host becomes the domain fence.
    pub fn new(seed: &Url, page_budget: usize) -> Self {
        let base_domain = seed.host_str().unwrap_or_default().to_string();
        let mut session = Self {
            base_domain,
            page_budget,
            visited: HashSet::new(),
            queued: HashSet::new(),
            queue: VecDeque::new(),
        };
        let mut seed = seed.clone();
        seed.set_fragment(None);
        session.enqueue(seed);
        session
    }

    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    pub fn pages_visited(&self) -> usize {
        self.visited.len()
    }

    pub fn state(&self) -> FrontierState {
        if self.queue.is_empty() || self.visited.len() >= self.page_budget {
            FrontierState::Done
        } else {
            FrontierState::Active
        }
    }

    /// Pop the next URL to fetch, marking it visited.
    ///
    /// Returns `None` once the queue is drained or the budget is exhausted;
    /// `pages_visited() <= page_budget` holds at all times.
    pub fn next_url(&mut self) -> Option<String> {
        while self.visited.len() < self.page_budget {
            let url = self.queue.pop_front()?;
            self.queued.remove(&url);
            if self.visited.contains(&url) {
                continue;
            }
            self.visited.insert(url.clone());
            return Some(url);
        }
        None
    }

    /// Normalize a discovered href against the page it appeared on and
    /// enqueue it if it belongs to the crawl. Returns whether it was queued.
    pub fn enqueue_link(&mut self, page: &Url, href: &str) -> bool {
        match normalize_link(page, href) {
            Some(url) => self.enqueue(url),
            None => false,
        }
    }

    fn enqueue(&mut self, url: Url) -> bool {
        if url.host_str() != Some(self.base_domain.as_str()) {
            return false;
        }
        let key = url.to_string();
        if self.visited.contains(&key) || self.queued.contains(&key) {
            return false;
        }
        self.queued.insert(key.clone());
        self.queue.push_back(key);
        true
    }
}

/// Resolve an href against the current page URL and strip the fragment.
///
/// Mail, phone and javascript pseudo-links are dropped, as is anything that
/// does not resolve to http(s).
pub fn normalize_link(page: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("javascript:")
    {
        return None;
    }
    let mut resolved = page.join(href).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved)
}

/// Final summary of one crawl, persisted as a `crawl_results` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub session_id: String,
    pub business_id: Option<String>,
    pub start_url: String,
    pub pages_visited: u32,
    pub products_found: u32,
    /// "completed", "timed_out" or "cancelled".
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}
