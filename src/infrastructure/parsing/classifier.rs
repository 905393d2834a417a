//! Page classification and page-level metadata
//!
//! Decides whether a fetched page is a single-product page or a
//! listing/collection page, selecting the extraction strategy. The decision
//! is a coarse binary heuristic; a wrong call self-corrects because the
//! listing extractor tolerates zero-match pages.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

/// Kind of storefront page, as far as extraction strategy is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// A single product's page; candidate for the structured feed.
    Product,
    /// Anything else: collection, category, landing or plain content page.
    Listing,
}

static OG_TYPE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[property='og:type']").expect("static selector"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("static selector"));
static SITE_NAME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[property='og:site_name']").expect("static selector"));
static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("static selector"));

/// Classify a page. URL path markers win over document markers; the default
/// is `Listing`.
pub fn classify(url: &Url, document: &Html) -> PageKind {
    let path = url.path();
    if path.contains("/product/") || path.contains("/products/") {
        return PageKind::Product;
    }

    let og_is_product = document
        .select(&OG_TYPE_SELECTOR)
        .filter_map(|meta| meta.value().attr("content"))
        .any(|content| content.trim().eq_ignore_ascii_case("product"));
    if og_is_product {
        return PageKind::Product;
    }

    PageKind::Listing
}

/// Derive a display name for the storefront from the page itself:
/// `<title>` before a `|` separator, then `og:site_name`, then the first
/// `h1`, then a generic fallback.
pub fn store_name(document: &Html) -> String {
    if let Some(title) = document.select(&TITLE_SELECTOR).next() {
        let text = title.text().collect::<String>();
        let name = text.split('|').next().unwrap_or_default().trim().to_string();
        if !name.is_empty() {
            return name;
        }
    }

    if let Some(name) = document
        .select(&SITE_NAME_SELECTOR)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    {
        return name;
    }

    if let Some(h1) = document.select(&H1_SELECTOR).next() {
        let text = h1.text().collect::<String>().trim().to_string();
        if !text.is_empty() {
            return text;
        }
    }

    "Business".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).expect("test url")
    }

    #[test]
    fn product_path_marker_wins() {
        let doc = Html::parse_document("<html></html>");
        assert_eq!(
            classify(&url("https://x.com/products/blue-hoodie"), &doc),
            PageKind::Product
        );
        assert_eq!(
            classify(&url("https://x.com/product/123"), &doc),
            PageKind::Product
        );
    }

    #[test]
    fn og_type_meta_marks_product_pages() {
        let doc = Html::parse_document(
            r#"<html><head><meta property="og:type" content="product"></head></html>"#,
        );
        assert_eq!(classify(&url("https://x.com/item/123"), &doc), PageKind::Product);
    }

    #[test]
    fn default_is_listing() {
        let doc = Html::parse_document("<html><body><p>hello</p></body></html>");
        assert_eq!(
            classify(&url("https://x.com/collections/all"), &doc),
            PageKind::Listing
        );
    }

    #[test]
    fn store_name_prefers_title_before_separator() {
        let doc = Html::parse_document(
            "<html><head><title>Acme Outfitters | Home</title></head></html>",
        );
        assert_eq!(store_name(&doc), "Acme Outfitters");
    }

    #[test]
    fn store_name_falls_back_to_site_name_then_h1() {
        let doc = Html::parse_document(
            r#"<html><head><meta property="og:site_name" content="Acme"></head></html>"#,
        );
        assert_eq!(store_name(&doc), "Acme");

        let doc = Html::parse_document("<html><body><h1>Acme Shop</h1></body></html>");
        assert_eq!(store_name(&doc), "Acme Shop");

        let doc = Html::parse_document("<html><body></body></html>");
        assert_eq!(store_name(&doc), "Business");
    }
}
