//! Repository interface for catalog storage
//!
//! Contains the trait definition the crawl orchestrator talks to; the SQLite
//! implementation lives in the infrastructure layer.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::product::{BusinessRecord, ProductRecord};
use crate::domain::session::CrawlSummary;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert the business row a crawl's products hang off.
    async fn insert_business(&self, business: &BusinessRecord) -> Result<()>;

    /// Insert one batch of product records. Retrying a batch is safe because
    /// the caller deduplicates before insert.
    async fn insert_products(&self, products: &[ProductRecord]) -> Result<()>;

    async fn count_products(&self, business_id: &str) -> Result<u32>;

    /// Case-insensitive name/description search for the retrieval collaborator.
    async fn search_products(
        &self,
        business_id: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<ProductRecord>>;

    /// Persist the final summary of a crawl session.
    async fn save_crawl_summary(&self, summary: &CrawlSummary) -> Result<()>;
}
