//! Parsing context for HTML extraction
//!
//! Carries the page-level information extraction needs: the page URL (also
//! the base for resolving relative links) and the per-page product budget.

use url::Url;

use super::config::DEFAULT_MAX_PRODUCTS;

/// Context information for one page's extraction pass.
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// URL of the page being parsed; base for relative resolution and the
    /// default product URL.
    pub page_url: Url,

    /// Maximum containers to process on this page.
    pub max_products: usize,
}

impl ParseContext {
    pub fn new(page_url: Url) -> Self {
        Self {
            page_url,
            max_products: DEFAULT_MAX_PRODUCTS,
        }
    }

    pub fn with_max_products(mut self, max_products: usize) -> Self {
        self.max_products = max_products;
        self
    }
}
