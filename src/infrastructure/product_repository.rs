//! SQLite-backed catalog storage
//!
//! Implements the `CatalogStore` interface over the schema created by
//! `DatabaseConnection::migrate`. Color and size sets are stored as JSON
//! text columns.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::domain::product::{BusinessRecord, ProductRecord};
use crate::domain::repositories::CatalogStore;
use crate::domain::session::CrawlSummary;

#[derive(Clone)]
pub struct ProductRepository {
    pool: Arc<SqlitePool>,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ProductRecord> {
        let colors: String = row.try_get("colors")?;
        let sizes: String = row.try_get("sizes")?;
        Ok(ProductRecord {
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            description: row.try_get::<Option<String>, _>("description")?.unwrap_or_default(),
            image_url: row.try_get("image_url")?,
            product_url: row.try_get("product_url")?,
            category: row.try_get("category")?,
            colors: serde_json::from_str(&colors).unwrap_or_default(),
            sizes: serde_json::from_str(&sizes).unwrap_or_default(),
            in_stock: row.try_get("in_stock")?,
            brand: row.try_get("brand")?,
            business_id: row.try_get("business_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl CatalogStore for ProductRepository {
    async fn insert_business(&self, business: &BusinessRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO businesses (id, name, source_url, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&business.id)
        .bind(&business.name)
        .bind(&business.source_url)
        .bind(business.created_at)
        .execute(&*self.pool)
        .await
        .context("Failed to insert business")?;
        Ok(())
    }

    async fn insert_products(&self, products: &[ProductRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to open transaction")?;
        for product in products {
            let colors = serde_json::to_string(&product.colors)?;
            let sizes = serde_json::to_string(&product.sizes)?;
            sqlx::query(
                r#"
                INSERT INTO products
                (business_id, name, price, description, image_url, product_url,
                 category, brand, colors, sizes, in_stock, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&product.business_id)
            .bind(&product.name)
            .bind(product.price)
            .bind(&product.description)
            .bind(&product.image_url)
            .bind(&product.product_url)
            .bind(&product.category)
            .bind(&product.brand)
            .bind(colors)
            .bind(sizes)
            .bind(product.in_stock)
            .bind(product.created_at)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert product '{}'", product.name))?;
        }
        tx.commit().await.context("Failed to commit product batch")?;
        Ok(())
    }

    async fn count_products(&self, business_id: &str) -> Result<u32> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM products WHERE business_id = ?")
            .bind(business_id)
            .fetch_one(&*self.pool)
            .await?;
        let count: i64 = row.try_get("n")?;
        Ok(count as u32)
    }

    async fn search_products(
        &self,
        business_id: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<ProductRecord>> {
        let pattern = format!("%{}%", query.to_lowercase());
        let rows = sqlx::query(
            r#"
            SELECT business_id, name, price, description, image_url, product_url,
                   category, brand, colors, sizes, in_stock, created_at
            FROM products
            WHERE business_id = ?
              AND (LOWER(name) LIKE ? OR LOWER(description) LIKE ?)
            ORDER BY name ASC
            LIMIT ?
            "#,
        )
        .bind(business_id)
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&*self.pool)
        .await
        .context("Product search failed")?;

        rows.iter().map(Self::record_from_row).collect()
    }

    async fn save_crawl_summary(&self, summary: &CrawlSummary) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO crawl_results
            (session_id, business_id, start_url, pages_visited, products_found,
             status, started_at, completed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&summary.session_id)
        .bind(&summary.business_id)
        .bind(&summary.start_url)
        .bind(summary.pages_visited)
        .bind(summary.products_found)
        .bind(&summary.status)
        .bind(summary.started_at)
        .bind(summary.completed_at)
        .execute(&*self.pool)
        .await
        .context("Failed to save crawl summary")?;
        Ok(())
    }
}
