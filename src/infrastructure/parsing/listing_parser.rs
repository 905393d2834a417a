//! Heuristic product extraction from listing pages
//!
//! Locates repeated product containers via an ordered sequence of selector
//! groups, then extracts typed fields from each container through layered
//! fallback chains. Name is the only field without a safe default: a
//! container with no valid name yields nothing, every other field degrades
//! to a default rather than rejecting the record.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::domain::product::{ProductRecord, validate_name};
use crate::domain::taxonomy;

use super::config::{CURRENCY_SYMBOLS, ListingSelectors, MIN_CONTAINER_MATCHES};
use super::context::ParseContext;
use super::error::{ExtractionError, ExtractionResult};
use super::ContextualParser;

static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4").expect("static selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static selector"));
static IMAGE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img").expect("static selector"));
static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("static selector"));

/// First currency-prefixed numeric token in a blob of container text.
static CURRENCY_PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[$€£]\s*([0-9][0-9.,]*)").expect("static regex"));

/// First numeric token in a dedicated price string.
static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9][0-9.,]*").expect("static regex"));

/// Parser for extracting product records from listing pages.
pub struct ProductListParser {
    container_groups: Vec<(String, Selector)>,
    name_selectors: Vec<Selector>,
    price_value_selectors: Vec<Selector>,
    price_text_selectors: Vec<Selector>,
    description_selectors: Vec<Selector>,
    image_attributes: Vec<String>,
}

impl ProductListParser {
    /// Create a parser with the default selector configuration.
    pub fn new() -> ExtractionResult<Self> {
        Self::with_config(&ListingSelectors::default())
    }

    /// Create a parser from a selector configuration.
    pub fn with_config(config: &ListingSelectors) -> ExtractionResult<Self> {
        let mut container_groups = Vec::new();
        for group in &config.container_groups {
            match Selector::parse(&group.selector) {
                Ok(selector) => container_groups.push((group.name.clone(), selector)),
                Err(e) => {
                    warn!("Skipping container group '{}': {e}", group.name);
                }
            }
        }
        if container_groups.is_empty() {
            return Err(ExtractionError::invalid_selector(
                "container_groups",
                "no container selector group compiled",
            ));
        }

        Ok(Self {
            container_groups,
            name_selectors: compile_selectors(&config.name),
            price_value_selectors: compile_selectors(&config.price_value),
            price_text_selectors: compile_selectors(&config.price_text),
            description_selectors: compile_selectors(&config.description),
            image_attributes: config.image_attributes.clone(),
        })
    }
}

/// Compile selector strings, dropping (and logging) invalid ones.
fn compile_selectors(selector_strings: &[String]) -> Vec<Selector> {
    let mut selectors = Vec::new();
    for selector_str in selector_strings {
        match Selector::parse(selector_str) {
            Ok(selector) => selectors.push(selector),
            Err(e) => warn!("Failed to compile selector '{selector_str}': {e}"),
        }
    }
    selectors
}

impl ContextualParser for ProductListParser {
    type Output = Vec<ProductRecord>;
    type Context = ParseContext;

    /// Extract up to `context.max_products` records from a listing page.
    fn parse_with_context(
        &self,
        html: &Html,
        context: &Self::Context,
    ) -> ExtractionResult<Self::Output> {
        let (containers, tried_selectors) = self.discover_containers(html);
        if containers.is_empty() {
            return Err(ExtractionError::no_products_found(tried_selectors));
        }

        let mut records = Vec::new();
        for (index, container) in containers.iter().take(context.max_products).enumerate() {
            match self.extract_record(container, context) {
                Ok(record) => records.push(record),
                Err(e) => {
                    debug!(
                        "Skipping container {index} on {}: {e}",
                        context.page_url
                    );
                }
            }
        }

        if records.is_empty() {
            return Err(ExtractionError::no_products_found(tried_selectors));
        }

        debug!(
            "Extracted {} products from {} via {:?}",
            records.len(),
            context.page_url,
            tried_selectors.last()
        );
        Ok(records)
    }
}

impl ProductListParser {
    /// Find the container set for this page.
    ///
    /// Groups are evaluated in order; the first group matching at least
    /// [`MIN_CONTAINER_MATCHES`] elements is accepted and later groups are
    /// never evaluated. Fewer matches are indistinguishable from a false
    /// positive, so below the threshold the currency fallback runs instead.
    fn discover_containers<'a>(&self, html: &'a Html) -> (Vec<ElementRef<'a>>, Vec<String>) {
        let mut tried = Vec::new();
        for (name, selector) in &self.container_groups {
            tried.push(name.clone());
            let matches: Vec<ElementRef<'a>> = html.select(selector).collect();
            if matches.len() >= MIN_CONTAINER_MATCHES {
                return (matches, tried);
            }
        }

        tried.push("currency-fallback".to_string());
        (containers_by_currency(html), tried)
    }

    /// Extract one record from a container. Only the name can fail.
    fn extract_record(
        &self,
        container: &ElementRef<'_>,
        context: &ParseContext,
    ) -> ExtractionResult<ProductRecord> {
        let name = self.extract_name(container)?;

        let mut record =
            ProductRecord::new(name.clone(), self.extract_product_url(container, context));
        record.price = self.extract_price(container).unwrap_or(0.0);
        record.image_url = self.extract_image(container, context);
        if let Some(description) = self.extract_description(container) {
            record.description = description;
        }
        record.category = Some(taxonomy::categorize(&name));
        record.colors = taxonomy::extract_colors(&name);
        record.sizes = taxonomy::extract_sizes(&name);
        Ok(record)
    }

    /// Name fallback chain: platform title selectors and structured
    /// attributes, then the container's first link text, then its first
    /// heading. Every candidate must pass validation; an invalid candidate
    /// moves the chain along.
    fn extract_name(&self, container: &ElementRef<'_>) -> ExtractionResult<String> {
        let from_selectors = self
            .name_selectors
            .iter()
            .filter_map(|selector| first_text(container, selector));
        let from_link = first_text(container, &LINK_SELECTOR);
        let from_heading = first_text(container, &HEADING_SELECTOR);

        from_selectors
            .chain(from_link)
            .chain(from_heading)
            .find(|candidate| validate_name(candidate))
            .ok_or_else(|| ExtractionError::required_field_missing("name", Some("listing container")))
    }

    /// Price fallback chain: structured attributes, then class-matched price
    /// element text, then a currency-prefixed scan of the container text.
    /// The first stage that yields a parseable number wins.
    fn extract_price(&self, container: &ElementRef<'_>) -> Option<f64> {
        for selector in &self.price_value_selectors {
            if let Some(element) = container.select(selector).next() {
                let candidate = element
                    .value()
                    .attr("content")
                    .or_else(|| element.value().attr("data-price"))
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| element.text().collect::<String>());
                if let Some(price) = parse_price(&candidate) {
                    return Some(price);
                }
            }
        }

        for selector in &self.price_text_selectors {
            if let Some(element) = container.select(selector).next() {
                let text = element.text().collect::<String>();
                if let Some(price) = parse_price(&text) {
                    return Some(price);
                }
            }
        }

        let text = container.text().collect::<String>();
        CURRENCY_PRICE_RE
            .captures(&text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| parse_number(m.as_str()))
    }

    /// First `img` element's source, tried across lazy-load attribute names
    /// in fixed priority order; source sets are reduced to their first URL.
    fn extract_image(&self, container: &ElementRef<'_>, context: &ParseContext) -> Option<String> {
        let img = container.select(&IMAGE_SELECTOR).next()?;
        for attribute in &self.image_attributes {
            let Some(raw) = img.value().attr(attribute) else {
                continue;
            };
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let candidate = if attribute.contains("srcset") {
                raw.split(',').next()?.trim().split_whitespace().next()?
            } else {
                raw
            };
            if let Ok(absolute) = context.page_url.join(candidate) {
                return Some(absolute.to_string());
            }
        }
        None
    }

    /// First link's href resolved against the base URL; the page URL when
    /// the container carries no product-specific link.
    fn extract_product_url(&self, container: &ElementRef<'_>, context: &ParseContext) -> String {
        container
            .select(&LINK_SELECTOR)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| context.page_url.join(href.trim()).ok())
            .map(|u| u.to_string())
            .unwrap_or_else(|| context.page_url.to_string())
    }

    /// Description fallback chain; candidates under 10 characters are
    /// treated as not found. The synthesized `"Product: {name}"` default is
    /// applied by the caller when this returns `None`.
    fn extract_description(&self, container: &ElementRef<'_>) -> Option<String> {
        self.description_selectors
            .iter()
            .filter_map(|selector| first_text(container, selector))
            .chain(first_text(container, &PARAGRAPH_SELECTOR))
            .find(|text| text.chars().count() >= 10)
            .map(|text| truncate_chars(&text, 500))
    }
}

/// Text of the first element matching `selector`, trimmed, if non-empty.
fn first_text(container: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    container
        .select(selector)
        .next()
        .map(|e| collapse_whitespace(&e.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Currency fallback for bespoke templates without semantic class names:
/// every `h1`-`h4` heading with non-empty text whose parent's text carries a
/// currency symbol marks that parent as a candidate container.
fn containers_by_currency(html: &Html) -> Vec<ElementRef<'_>> {
    let mut seen = std::collections::HashSet::new();
    let mut containers = Vec::new();
    for heading in html.select(&HEADING_SELECTOR) {
        let text = heading.text().collect::<String>();
        if text.trim().is_empty() {
            continue;
        }
        let Some(parent) = heading.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        let parent_text = parent.text().collect::<String>();
        if parent_text.contains(CURRENCY_SYMBOLS) && seen.insert(parent.id()) {
            containers.push(parent);
        }
    }
    containers
}

/// Parse a price out of a dedicated price string (attribute value or price
/// element text).
fn parse_price(text: &str) -> Option<f64> {
    let m = NUMBER_RE.find(text)?;
    parse_number(m.as_str())
}

/// Normalize a numeric token to `f64`. A comma followed by exactly two
/// trailing digits is a decimal separator ("19,99"); any other comma or dot
/// left of it is a thousands separator.
fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    if let Some(idx) = cleaned.rfind(',') {
        let fraction = &cleaned[idx + 1..];
        if fraction.len() == 2 && fraction.chars().all(|c| c.is_ascii_digit()) {
            let integer: String = cleaned[..idx]
                .chars()
                .filter(|c| c.is_ascii_digit())
                .collect();
            return format!("{integer}.{fraction}").parse().ok();
        }
    }

    cleaned.replace(',', "").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ProductListParser {
        ProductListParser::new().expect("default parser")
    }

    fn context() -> ParseContext {
        ParseContext::new(Url::parse("https://x.com/collections/all").unwrap())
    }

    #[test]
    fn number_normalization() {
        assert_eq!(parse_number("19.99"), Some(19.99));
        assert_eq!(parse_number("19,99"), Some(19.99));
        assert_eq!(parse_number("1,299.00"), Some(1299.00));
        assert_eq!(parse_number("1.299,95"), Some(1299.95));
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn price_from_text_with_currency() {
        assert_eq!(parse_price("$ 19.99"), Some(19.99));
        assert_eq!(parse_price("€1.234,50 incl. VAT"), Some(1234.50));
        assert_eq!(parse_price("no price here"), None);
    }

    #[test]
    fn first_matching_group_short_circuits_later_ones() {
        // Page matches both the "woocommerce" group and the "storefront-card"
        // group; the earlier group must win and the later one must never be
        // evaluated.
        let html = Html::parse_document(
            r#"<html><body>
                <ul>
                    <li class="product"><h3>Woo One</h3></li>
                    <li class="product"><h3>Woo Two</h3></li>
                    <li class="product"><h3>Woo Three</h3></li>
                </ul>
                <div class="product-card"><h3>Card One</h3></div>
                <div class="product-card"><h3>Card Two</h3></div>
                <div class="product-card"><h3>Card Three</h3></div>
            </body></html>"#,
        );
        let p = parser();
        let (containers, tried) = p.discover_containers(&html);
        assert_eq!(containers.len(), 3);
        assert_eq!(tried, vec!["woocommerce".to_string()]);

        let records = p.parse_with_context(&html, &context()).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Woo One", "Woo Two", "Woo Three"]);
    }

    #[test]
    fn below_threshold_groups_are_rejected() {
        // Two matches everywhere: statistically indistinguishable from a
        // false positive, so the page yields nothing.
        let html = Html::parse_document(
            r#"<html><body>
                <div class="product-card"><a href="/p/1">Alpha Tee</a></div>
                <div class="product-card"><a href="/p/2">Beta Tee</a></div>
            </body></html>"#,
        );
        let result = parser().parse_with_context(&html, &context());
        assert!(matches!(
            result,
            Err(ExtractionError::NoProductsFound { .. })
        ));
    }

    #[test]
    fn currency_fallback_catches_bespoke_templates() {
        let html = Html::parse_document(
            r#"<html><body>
                <div><h3>Soy Candle</h3><span>$12.00</span></div>
                <div><h3>Clay Vase</h3><span>$30</span></div>
                <div><h3>Linen Napkin</h3><span>$8.50</span></div>
            </body></html>"#,
        );
        let p = parser();
        let (containers, tried) = p.discover_containers(&html);
        assert_eq!(containers.len(), 3);
        assert_eq!(tried.last().map(String::as_str), Some("currency-fallback"));

        let records = p.parse_with_context(&html, &context()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, "Soy Candle");
        assert_eq!(records[0].price, 12.0);
    }

    #[test]
    fn structured_price_wins_over_text_price() {
        let html = Html::parse_document(
            r#"<html><body>
                <div class="product-card">
                    <h3>Alpha Hoodie</h3>
                    <span itemprop="price" content="25.00"></span>
                    <span class="price">$99.99</span>
                </div>
                <div class="product-card"><h3>Beta Hoodie</h3></div>
                <div class="product-card"><h3>Gamma Hoodie</h3></div>
            </body></html>"#,
        );
        let records = parser().parse_with_context(&html, &context()).unwrap();
        assert_eq!(records[0].price, 25.00);
    }

    #[test]
    fn name_only_container_gets_defaults() {
        let html = Html::parse_document(
            r#"<html><body>
                <div class="product-card"><h3>Plain Tee</h3></div>
                <div class="product-card"><h3>Plain Cap</h3></div>
                <div class="product-card"><h3>Plain Sock</h3></div>
            </body></html>"#,
        );
        let records = parser().parse_with_context(&html, &context()).unwrap();
        let record = &records[0];
        assert_eq!(record.price, 0.0);
        assert!(record.image_url.is_none());
        assert_eq!(record.description, "Product: Plain Tee");
        assert_eq!(record.product_url, "https://x.com/collections/all");
        assert!(record.in_stock);
    }

    #[test]
    fn invalid_names_move_the_chain_along() {
        // The title class holds a placeholder; the heading holds the real
        // name. Containers whose every candidate fails yield nothing.
        let html = Html::parse_document(
            r#"<html><body>
                <div class="product-card">
                    <span class="product-title">Sale</span>
                    <h3>Down Parka</h3>
                </div>
                <div class="product-card"><span class="product-title">Buy Now</span></div>
                <div class="product-card"><h3>Rain Boot</h3></div>
            </body></html>"#,
        );
        let records = parser().parse_with_context(&html, &context()).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Down Parka", "Rain Boot"]);
    }

    #[test]
    fn lazy_load_and_srcset_images_resolve_absolute() {
        let html = Html::parse_document(
            r#"<html><body>
                <div class="product-card">
                    <h3>Lazy Tee</h3>
                    <img data-src="/img/lazy.jpg">
                </div>
                <div class="product-card">
                    <h3>Setted Tee</h3>
                    <img srcset="//cdn.x.com/a.jpg 1x, //cdn.x.com/b.jpg 2x">
                </div>
                <div class="product-card">
                    <h3>Plain Tee</h3>
                    <img src="https://cdn.x.com/c.jpg">
                </div>
            </body></html>"#,
        );
        let records = parser().parse_with_context(&html, &context()).unwrap();
        assert_eq!(
            records[0].image_url.as_deref(),
            Some("https://x.com/img/lazy.jpg")
        );
        assert_eq!(
            records[1].image_url.as_deref(),
            Some("https://cdn.x.com/a.jpg")
        );
        assert_eq!(
            records[2].image_url.as_deref(),
            Some("https://cdn.x.com/c.jpg")
        );
    }

    #[test]
    fn short_descriptions_are_treated_as_missing() {
        let html = Html::parse_document(
            r#"<html><body>
                <div class="product-card">
                    <h3>Canvas Tote</h3>
                    <p>tiny</p>
                </div>
                <div class="product-card">
                    <h3>Waxed Tote</h3>
                    <p>A roomy waxed-canvas tote for daily errands.</p>
                </div>
                <div class="product-card"><h3>Third Tote</h3></div>
            </body></html>"#,
        );
        let records = parser().parse_with_context(&html, &context()).unwrap();
        assert_eq!(records[0].description, "Product: Canvas Tote");
        assert_eq!(
            records[1].description,
            "A roomy waxed-canvas tote for daily errands."
        );
    }

    #[test]
    fn max_products_bounds_extraction() {
        let cards: String = (0..10)
            .map(|i| format!(r#"<div class="product-card"><h3>Item {i} Tee</h3></div>"#))
            .collect();
        let html = Html::parse_document(&format!("<html><body>{cards}</body></html>"));
        let ctx = context().with_max_products(4);
        let records = parser().parse_with_context(&html, &ctx).unwrap();
        assert_eq!(records.len(), 4);
    }

    #[test]
    fn taxonomy_fields_derive_from_name() {
        let html = Html::parse_document(
            r#"<html><body>
                <div class="product-card"><h3>Navy Blue Hoodie XL</h3></div>
                <div class="product-card"><h3>Gray Running Sneaker</h3></div>
                <div class="product-card"><h3>Ceramic Mug</h3></div>
            </body></html>"#,
        );
        let records = parser().parse_with_context(&html, &context()).unwrap();
        assert_eq!(records[0].category.as_deref(), Some("Hoodies & Sweatshirts"));
        assert_eq!(records[0].colors, vec!["blue", "navy"]);
        assert_eq!(records[0].sizes, vec!["XL"]);
        assert_eq!(records[1].category.as_deref(), Some("Footwear"));
        assert_eq!(records[2].category.as_deref(), Some("Other"));
    }
}
