//! HTML parsing infrastructure for storefront pages
//!
//! Trait-based parsing architecture with layered fallback selector
//! strategies and per-container error recovery.

pub mod classifier;
pub mod config;
pub mod context;
pub mod error;
pub mod listing_parser;

// Re-export public types
pub use classifier::{PageKind, classify, store_name};
pub use config::ListingSelectors;
pub use context::ParseContext;
pub use error::{ExtractionError, ExtractionResult};
pub use listing_parser::ProductListParser;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

/// Parser trait with context support: parse an already-built document with
/// the page-level information extraction needs (base URL, budgets).
pub trait ContextualParser {
    type Output;
    type Context;

    fn parse_with_context(
        &self,
        html: &Html,
        context: &Self::Context,
    ) -> ExtractionResult<Self::Output>;
}

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static selector"));

/// Collect every href on the page, raw; the crawl session normalizes and
/// filters them against its domain fence.
pub fn extract_links(document: &Html) -> Vec<String> {
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| href.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_all_hrefs() {
        let html = Html::parse_document(
            r#"<html><body>
                <a href="/a">A</a>
                <a href="https://x.com/b">B</a>
                <a>no href</a>
            </body></html>"#,
        );
        let links = extract_links(&html);
        assert_eq!(links, vec!["/a", "https://x.com/b"]);
    }
}
