//! Structured product feed extraction
//!
//! Some storefront platforms expose a machine-readable JSON representation
//! of every product page at a deterministic URL transform (the canonical
//! product path with a `.json` suffix). When available it beats heuristic
//! HTML extraction, so product pages are tried against the feed first.
//!
//! This boundary is defensive by contract: a missing, malformed or
//! unreachable feed yields `None`, never an error.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::domain::product::{ProductRecord, validate_name};
use crate::domain::taxonomy;

use super::http_client::HttpClient;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("static regex"));

/// Top-level feed envelope. The `product` key missing means "not a
/// structured-feed platform", not an error.
#[derive(Debug, Deserialize)]
struct FeedEnvelope {
    product: Option<FeedProduct>,
}

#[derive(Debug, Default, Deserialize)]
struct FeedProduct {
    title: Option<String>,
    body_html: Option<String>,
    product_type: Option<String>,
    vendor: Option<String>,
    #[serde(default)]
    options: Vec<FeedOption>,
    #[serde(default)]
    variants: Vec<FeedVariant>,
    #[serde(default)]
    images: Vec<FeedImage>,
}

#[derive(Debug, Default, Deserialize)]
struct FeedOption {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FeedVariant {
    option1: Option<String>,
    option2: Option<String>,
    /// Platforms serialize prices both as strings and as numbers.
    price: Option<serde_json::Value>,
    #[serde(default)]
    available: bool,
}

#[derive(Debug, Default, Deserialize)]
struct FeedImage {
    src: Option<String>,
}

/// Client for the structured product feed, sharing the crawl's HTTP client.
pub struct ProductFeedClient {
    http_client: Arc<HttpClient>,
}

impl ProductFeedClient {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self { http_client }
    }

    /// Fetch and convert the structured representation of a product page.
    ///
    /// Returns `None` when the URL has no feed transform, the feed is
    /// unreachable or malformed, or the feed's title fails name validation.
    pub async fn fetch_product(&self, product_url: &Url) -> Option<ProductRecord> {
        let json_url = feed_url(product_url)?;
        let body = match self.http_client.fetch_json(&json_url).await {
            Ok(body) => body,
            Err(e) => {
                debug!("Structured feed unavailable for {product_url}: {e}");
                return None;
            }
        };

        let envelope: FeedEnvelope = match serde_json::from_value(body) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!("Structured feed malformed for {product_url}: {e}");
                return None;
            }
        };
        let product = envelope.product?;
        build_record(product, product_url)
    }
}

/// The feed URL for a canonical product path: query and fragment stripped,
/// `.json` appended. `None` for URLs outside the product namespace.
pub fn feed_url(product_url: &Url) -> Option<String> {
    if !product_url.path().contains("/products/") {
        return None;
    }
    let mut stripped = product_url.clone();
    stripped.set_query(None);
    stripped.set_fragment(None);
    let trimmed = stripped.as_str().trim_end_matches('/').to_string();
    Some(format!("{trimmed}.json"))
}

fn build_record(product: FeedProduct, product_url: &Url) -> Option<ProductRecord> {
    let name = product.title.as_deref().map(str::trim).unwrap_or_default();
    if !validate_name(name) {
        debug!("Feed title rejected for {product_url}: {name:?}");
        return None;
    }

    let option_names: Vec<String> = product
        .options
        .iter()
        .map(|o| o.name.as_deref().unwrap_or_default().to_lowercase())
        .collect();

    let mut colors = Vec::new();
    let mut sizes = Vec::new();
    let mut prices = Vec::new();
    let mut in_stock = false;
    for variant in &product.variants {
        classify_option(variant.option1.as_deref(), option_names.first(), &mut colors, &mut sizes);
        classify_option(variant.option2.as_deref(), option_names.get(1), &mut colors, &mut sizes);
        if let Some(price) = variant.price.as_ref().and_then(price_value) {
            prices.push(price);
        }
        in_stock |= variant.available;
    }

    let mut record = ProductRecord::new(name, product_url.to_string());
    record.price = prices.iter().copied().fold(f64::INFINITY, f64::min);
    if !record.price.is_finite() {
        record.price = 0.0;
    }
    record.in_stock = in_stock;
    record.colors = colors;
    record.sizes = sizes;
    record.brand = product.vendor.filter(|v| !v.trim().is_empty());
    record.category = Some(
        product
            .product_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| taxonomy::categorize(name)),
    );
    if let Some(description) = product.body_html.as_deref().map(strip_tags) {
        if !description.is_empty() {
            record.description = description.chars().take(500).collect();
        }
    }
    record.image_url = product
        .images
        .iter()
        .take(3)
        .find_map(|image| image.src.as_deref())
        .and_then(|src| product_url.join(src).ok())
        .map(|u| u.to_string());

    Some(record)
}

/// An option value is a size when its declared option name mentions "size"
/// or the value itself looks numeric; otherwise it is treated as a color.
fn classify_option(
    value: Option<&str>,
    option_name: Option<&String>,
    colors: &mut Vec<String>,
    sizes: &mut Vec<String>,
) {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return;
    };
    let name_says_size = option_name.is_some_and(|n| n.contains("size"));
    let looks_numeric = value.chars().any(|c| c.is_ascii_digit());
    if name_says_size || looks_numeric {
        let canonical = value.to_uppercase();
        if !sizes.contains(&canonical) {
            sizes.push(canonical);
        }
    } else {
        let canonical = value.to_lowercase();
        if !colors.contains(&canonical) {
            colors.push(canonical);
        }
    }
}

fn price_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Crude tag strip for feed body HTML; enough for a text description field.
fn strip_tags(html: &str) -> String {
    let text = TAG_RE.replace_all(html, " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).expect("test url")
    }

    fn feed_product(json: &str) -> FeedProduct {
        let envelope: FeedEnvelope = serde_json::from_str(json).expect("fixture json");
        envelope.product.expect("fixture product")
    }

    #[test]
    fn feed_url_transform() {
        assert_eq!(
            feed_url(&url("https://x.com/products/blue-hoodie?variant=1#top")).as_deref(),
            Some("https://x.com/products/blue-hoodie.json")
        );
        assert!(feed_url(&url("https://x.com/collections/all")).is_none());
    }

    #[test]
    fn full_feed_converts_to_record() {
        let product = feed_product(
            r#"{
                "product": {
                    "title": "Trail Hoodie",
                    "body_html": "<p>Warm <b>fleece</b> hoodie for cold mornings.</p>",
                    "product_type": "Outerwear",
                    "vendor": "Acme",
                    "options": [{"name": "Color"}, {"name": "Size"}],
                    "variants": [
                        {"option1": "Forest", "option2": "M", "price": "45.00", "available": false},
                        {"option1": "Forest", "option2": "L", "price": "42.00", "available": true},
                        {"option1": "Sand", "option2": "M", "price": "45.00", "available": false}
                    ],
                    "images": [{"src": "https://cdn.x.com/1.jpg"}, {"src": "https://cdn.x.com/2.jpg"}]
                }
            }"#,
        );
        let record = build_record(product, &url("https://x.com/products/trail-hoodie")).unwrap();
        assert_eq!(record.name, "Trail Hoodie");
        assert_eq!(record.price, 42.00);
        assert!(record.in_stock);
        assert_eq!(record.colors, vec!["forest", "sand"]);
        assert_eq!(record.sizes, vec!["M", "L"]);
        assert_eq!(record.brand.as_deref(), Some("Acme"));
        assert_eq!(record.category.as_deref(), Some("Outerwear"));
        assert_eq!(record.description, "Warm fleece hoodie for cold mornings.");
        assert_eq!(record.image_url.as_deref(), Some("https://cdn.x.com/1.jpg"));
    }

    #[test]
    fn numeric_looking_values_classify_as_sizes() {
        let product = feed_product(
            r#"{
                "product": {
                    "title": "Road Sneaker",
                    "options": [{"name": "Shoe size"}],
                    "variants": [
                        {"option1": "10.5", "price": "120.00", "available": true},
                        {"option1": "11", "price": "120.00", "available": true}
                    ]
                }
            }"#,
        );
        let record = build_record(product, &url("https://x.com/products/road-sneaker")).unwrap();
        assert_eq!(record.sizes, vec!["10.5", "11"]);
        assert!(record.colors.is_empty());
    }

    #[test]
    fn missing_variants_mean_out_of_stock_and_zero_price() {
        let product = feed_product(r#"{"product": {"title": "Gift Card Stand"}}"#);
        let record = build_record(product, &url("https://x.com/products/stand")).unwrap();
        assert_eq!(record.price, 0.0);
        assert!(!record.in_stock);
        assert_eq!(record.description, "Product: Gift Card Stand");
    }

    #[test]
    fn invalid_title_yields_none() {
        let product = feed_product(r#"{"product": {"title": "ab"}}"#);
        assert!(build_record(product, &url("https://x.com/products/x")).is_none());
    }

    #[test]
    fn missing_product_key_is_not_an_error() {
        let envelope: FeedEnvelope = serde_json::from_str(r#"{"other": 1}"#).unwrap();
        assert!(envelope.product.is_none());
    }
}
