//! Shopcrawl - Storefront Product Catalog Crawler
//!
//! Turns an arbitrary e-commerce storefront URL into a structured,
//! deduplicated set of product records for downstream use by a
//! retrieval/question-answering agent.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;
