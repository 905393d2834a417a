//! Data transfer objects for the crawl trigger interface
//!
//! Shapes consumed from and returned to the routing collaborator.

use serde::{Deserialize, Serialize};

/// Input of a crawl trigger.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlRequest {
    /// Seed storefront URL.
    pub url: String,

    /// Display name for the business; derived from the page when absent.
    pub business_name: Option<String>,

    /// Existing business to attach records to; a new id is minted when absent.
    pub business_id: Option<String>,

    /// Page budget override for this crawl.
    pub max_pages: Option<u32>,
}

impl CrawlRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            business_name: None,
            business_id: None,
            max_pages: None,
        }
    }
}

/// Successful crawl outcome.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlResponse {
    pub business_id: String,
    pub products_found: u32,
    pub message: String,
}
