//! Product record types and name validation for storefront extraction
//!
//! A `ProductRecord` is created once per extraction attempt, validated
//! immediately, and never mutated afterwards except to attach the owning
//! business id when it is handed to the persistence layer.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder strings that frequently leak out of navigation chrome and
/// call-to-action buttons; never valid product names.
const PLACEHOLDER_NAMES: &[&str] = &[
    "product",
    "products",
    "buy now",
    "sale",
    "shop",
    "add to cart",
    "sold out",
    "new arrival",
];

/// Minimum / maximum accepted product name length, in characters.
const NAME_MIN_CHARS: usize = 3;
const NAME_MAX_CHARS: usize = 200;

/// A single product extracted from a storefront page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    /// Price in the storefront's currency; 0.0 when no price could be parsed.
    pub price: f64,
    pub description: String,
    pub image_url: Option<String>,
    pub product_url: String,
    pub category: Option<String>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub in_stock: bool,
    /// Vendor/brand; only known when a structured feed reported it.
    pub brand: Option<String>,
    /// Owning business; attached by the crawl orchestrator before persisting.
    #[serde(rename = "businessId")]
    pub business_id: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Create a record with defaults for everything but the identity fields.
    pub fn new(name: impl Into<String>, product_url: impl Into<String>) -> Self {
        let name = name.into();
        let description = format!("Product: {name}");
        Self {
            name,
            price: 0.0,
            description,
            image_url: None,
            product_url: product_url.into(),
            category: None,
            colors: Vec::new(),
            sizes: Vec::new(),
            in_stock: true,
            brand: None,
            business_id: None,
            created_at: Utc::now(),
        }
    }

    /// Duplicate-detection fingerprint over the normalized name + product URL.
    ///
    /// Two records extracted in the same crawl with an equal fingerprint are
    /// considered the same product.
    pub fn fingerprint(&self) -> [u8; 32] {
        let key = format!(
            "{}\n{}",
            normalize_name(&self.name),
            self.product_url.trim().to_lowercase()
        );
        *blake3::hash(key.as_bytes()).as_bytes()
    }
}

/// Business (storefront) row handed to storage once per successful crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "sourceUrl")]
    pub source_url: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Validate a candidate product name.
///
/// Accepts trimmed names of 3..=200 characters that contain at least one
/// alphanumeric character and are not a known placeholder term. Pure and
/// deterministic: extraction re-run on identical HTML yields identical
/// accept/reject decisions.
pub fn validate_name(candidate: &str) -> bool {
    let trimmed = candidate.trim();
    let len = trimmed.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return false;
    }
    if !trimmed.chars().any(|c| c.is_alphanumeric()) {
        return false;
    }
    let lowered = trimmed.to_lowercase();
    !PLACEHOLDER_NAMES.contains(&lowered.as_str())
}

/// Lowercase and collapse internal whitespace for identity comparison.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Accumulates extracted records for one crawl, dropping duplicates.
#[derive(Debug, Default)]
pub struct ProductAggregator {
    seen: HashSet<[u8; 32]>,
    records: Vec<ProductRecord>,
}

impl ProductAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record unless an equal fingerprint was already collected.
    /// Returns whether the record was kept.
    pub fn push(&mut self, record: ProductRecord) -> bool {
        if self.seen.insert(record.fingerprint()) {
            self.records.push(record);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<ProductRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("Classic Oxford Shirt", true)]
    #[case("ab", false)] // under 3 chars
    #[case("   ", false)]
    #[case("", false)]
    #[case("Sale", false)] // placeholder
    #[case("BUY NOW", false)] // placeholder, case-insensitive
    #[case("product", false)]
    #[case("---", false)] // no alphanumeric
    #[case("!!!", false)]
    #[case("Tee", true)]
    #[case("A-1", true)]
    fn name_validation_cases(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(validate_name(name), expected, "name: {name:?}");
    }

    #[test]
    fn name_validation_rejects_overlong() {
        let long = "x".repeat(201);
        assert!(!validate_name(&long));
        let max = "x".repeat(200);
        assert!(validate_name(&max));
    }

    #[test]
    fn record_defaults_are_safe() {
        let record = ProductRecord::new("Wool Beanie", "https://x.com/p/1");
        assert_eq!(record.price, 0.0);
        assert_eq!(record.description, "Product: Wool Beanie");
        assert!(record.image_url.is_none());
        assert!(record.in_stock);
        assert!(record.business_id.is_none());
    }

    #[test]
    fn fingerprint_ignores_case_and_spacing() {
        let a = ProductRecord::new("Blue  Hoodie", "https://x.com/p/1");
        let b = ProductRecord::new("blue hoodie", "https://x.com/p/1");
        let c = ProductRecord::new("blue hoodie", "https://x.com/p/2");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn aggregator_drops_duplicates() {
        let mut agg = ProductAggregator::new();
        assert!(agg.push(ProductRecord::new("Blue Hoodie", "https://x.com/p/1")));
        assert!(!agg.push(ProductRecord::new("BLUE HOODIE", "https://x.com/p/1")));
        assert!(agg.push(ProductRecord::new("Blue Hoodie", "https://x.com/p/2")));
        assert_eq!(agg.len(), 2);
    }

    proptest! {
        /// Validation never panics and is deterministic for arbitrary input.
        #[test]
        fn validation_is_total_and_deterministic(s in ".*") {
            let first = validate_name(&s);
            let second = validate_name(&s);
            prop_assert_eq!(first, second);
        }
    }
}
