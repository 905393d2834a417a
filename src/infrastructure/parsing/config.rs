//! Selector configuration for heuristic product extraction
//!
//! Centralized, ordered CSS selector data. Container groups are evaluated
//! top to bottom and the order is deliberate: known e-commerce template
//! classes come before generic class-substring patterns, so a page matching
//! both is extracted with the more precise selector set.

use serde::{Deserialize, Serialize};

/// A container selector group accepted only when it matches at least
/// [`MIN_CONTAINER_MATCHES`] elements.
pub const MIN_CONTAINER_MATCHES: usize = 3;

/// Upper bound on containers processed per page.
pub const DEFAULT_MAX_PRODUCTS: usize = 50;

/// Currency symbols recognized by the price scan and the container fallback.
pub const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£'];

/// One named container selector group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorGroup {
    pub name: String,
    pub selector: String,
}

impl SelectorGroup {
    fn new(name: &str, selector: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
        }
    }
}

/// CSS selectors for product listing pages, with multiple fallbacks per field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSelectors {
    /// Ordered container groups; first group with enough matches wins.
    pub container_groups: Vec<SelectorGroup>,

    /// Name fallback chain: platform title classes first, then structured
    /// attributes. Link text and headings are tried afterwards in code.
    pub name: Vec<String>,

    /// Structured price sources (itemprop/meta/data attributes).
    pub price_value: Vec<String>,

    /// Class-substring price elements whose text carries the price.
    pub price_text: Vec<String>,

    /// Description fallback chain before the first-paragraph default.
    pub description: Vec<String>,

    /// Image source attributes in priority order; `src` first, then common
    /// lazy-load alternatives, then source sets.
    pub image_attributes: Vec<String>,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            container_groups: vec![
                SelectorGroup::new("woocommerce", "li.product, .woocommerce-loop-product"),
                SelectorGroup::new(
                    "storefront-card",
                    ".product-card, .product-card-wrapper, .grid-product, .product-tile",
                ),
                SelectorGroup::new("microdata", "[itemtype*='Product']"),
                SelectorGroup::new(
                    "generic-product",
                    ".product, .product-item, [class*='product-']",
                ),
                SelectorGroup::new("generic-item", ".item-card, [class*='item-']"),
            ],
            name: vec![
                ".product-title".to_string(),
                ".product-name".to_string(),
                ".product-item__title".to_string(),
                ".card__heading".to_string(),
                "[itemprop='name']".to_string(),
                "[data-product-title]".to_string(),
            ],
            price_value: vec![
                "[itemprop='price']".to_string(),
                "meta[itemprop='price']".to_string(),
                "[data-price]".to_string(),
            ],
            price_text: vec!["[class*='price']".to_string()],
            description: vec![
                "[itemprop='description']".to_string(),
                "[class*='description']".to_string(),
                "[class*='excerpt']".to_string(),
                "[class*='summary']".to_string(),
            ],
            image_attributes: vec![
                "src".to_string(),
                "data-src".to_string(),
                "data-lazy-src".to_string(),
                "data-original".to_string(),
                "srcset".to_string(),
                "data-srcset".to_string(),
            ],
        }
    }
}
