//! Database connection and pool management
//!
//! Handles SQLite connections using sqlx and creates the catalog schema.

use std::path::Path;

use anyhow::Result;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    pub async fn new(database_url: &str) -> Result<Self> {
        // Create the database file (and its directory) if necessary;
        // in-memory databases need neither.
        let db_path = database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");
        if !db_path.is_empty() && !db_path.starts_with(':') {
            if let Some(parent) = Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            if !Path::new(db_path).exists() {
                std::fs::File::create(db_path)?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        let create_businesses_sql = r#"
            CREATE TABLE IF NOT EXISTS businesses (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                source_url TEXT NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
        "#;

        let create_products_sql = r#"
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                business_id TEXT NOT NULL,
                name TEXT NOT NULL,
                price REAL NOT NULL DEFAULT 0,
                description TEXT,
                image_url TEXT,
                product_url TEXT NOT NULL,
                category TEXT,
                brand TEXT,
                colors TEXT NOT NULL DEFAULT '[]',
                sizes TEXT NOT NULL DEFAULT '[]',
                in_stock BOOLEAN NOT NULL DEFAULT 1,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (business_id) REFERENCES businesses (id) ON DELETE CASCADE
            )
        "#;

        let create_crawl_results_sql = r#"
            CREATE TABLE IF NOT EXISTS crawl_results (
                session_id TEXT PRIMARY KEY,
                business_id TEXT,
                start_url TEXT NOT NULL,
                pages_visited INTEGER NOT NULL DEFAULT 0,
                products_found INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                started_at DATETIME NOT NULL,
                completed_at DATETIME NOT NULL
            )
        "#;

        sqlx::query(create_businesses_sql).execute(&self.pool).await?;
        sqlx::query(create_products_sql).execute(&self.pool).await?;
        sqlx::query(create_crawl_results_sql)
            .execute(&self.pool)
            .await?;

        for index_sql in [
            "CREATE INDEX IF NOT EXISTS idx_products_business_id ON products (business_id)",
            "CREATE INDEX IF NOT EXISTS idx_products_name ON products (name)",
            "CREATE INDEX IF NOT EXISTS idx_crawl_results_business_id ON crawl_results (business_id)",
        ] {
            sqlx::query(index_sql).execute(&self.pool).await?;
        }

        Ok(())
    }
}
