//! Catalog storage round-trip tests against a temporary SQLite database

use std::sync::Arc;

use chrono::Utc;

use shopcrawl_lib::domain::product::{BusinessRecord, ProductRecord};
use shopcrawl_lib::domain::repositories::CatalogStore;
use shopcrawl_lib::domain::session::CrawlSummary;
use shopcrawl_lib::infrastructure::{DatabaseConnection, ProductRepository};

async fn test_store(dir: &tempfile::TempDir) -> Arc<ProductRepository> {
    let db_path = dir.path().join("catalog.db");
    let url = format!("sqlite:{}", db_path.display());
    let db = DatabaseConnection::new(&url).await.expect("connect");
    db.migrate().await.expect("migrate");
    Arc::new(ProductRepository::new(db.pool().clone()))
}

fn record(name: &str, business_id: &str) -> ProductRecord {
    let mut record = ProductRecord::new(name, format!("https://x.com/products/{name}"));
    record.business_id = Some(business_id.to_string());
    record
}

#[tokio::test]
async fn products_round_trip_with_variant_sets() {
    let dir = tempfile::tempdir().unwrap();
    let store = test_store(&dir).await;

    let business = BusinessRecord {
        id: "b-1".to_string(),
        name: "Acme Outfitters".to_string(),
        source_url: "https://x.com".to_string(),
        created_at: Utc::now(),
    };
    store.insert_business(&business).await.unwrap();

    let mut hoodie = record("Navy Hoodie", "b-1");
    hoodie.price = 49.5;
    hoodie.colors = vec!["navy".to_string()];
    hoodie.sizes = vec!["M".to_string(), "L".to_string()];
    hoodie.category = Some("Hoodies & Sweatshirts".to_string());
    hoodie.description = "A warm fleece hoodie for cold mornings.".to_string();
    let tee = record("White Tee", "b-1");
    store.insert_products(&[hoodie, tee]).await.unwrap();

    assert_eq!(store.count_products("b-1").await.unwrap(), 2);
    assert_eq!(store.count_products("b-2").await.unwrap(), 0);

    let found = store.search_products("b-1", "hoodie", 10).await.unwrap();
    assert_eq!(found.len(), 1);
    let found = &found[0];
    assert_eq!(found.name, "Navy Hoodie");
    assert_eq!(found.price, 49.5);
    assert_eq!(found.colors, vec!["navy"]);
    assert_eq!(found.sizes, vec!["M", "L"]);
    assert_eq!(found.category.as_deref(), Some("Hoodies & Sweatshirts"));
    assert!(found.in_stock);
}

#[tokio::test]
async fn search_matches_descriptions_case_insensitively() {
    let dir = tempfile::tempdir().unwrap();
    let store = test_store(&dir).await;

    let mut candle = record("Soy Candle", "b-1");
    candle.description = "Hand-poured with LAVENDER oil.".to_string();
    store.insert_products(&[candle]).await.unwrap();

    let found = store.search_products("b-1", "lavender", 10).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Soy Candle");

    let none = store.search_products("b-1", "cinnamon", 10).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn retrying_a_business_insert_is_safe() {
    let dir = tempfile::tempdir().unwrap();
    let store = test_store(&dir).await;

    let business = BusinessRecord {
        id: "b-1".to_string(),
        name: "Acme".to_string(),
        source_url: "https://x.com".to_string(),
        created_at: Utc::now(),
    };
    store.insert_business(&business).await.unwrap();
    store.insert_business(&business).await.unwrap();
}

#[tokio::test]
async fn crawl_summaries_are_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let store = test_store(&dir).await;

    let started_at = Utc::now();
    let summary = CrawlSummary {
        session_id: "s-1".to_string(),
        business_id: Some("b-1".to_string()),
        start_url: "https://x.com".to_string(),
        pages_visited: 4,
        products_found: 12,
        status: "completed".to_string(),
        started_at,
        completed_at: Utc::now(),
    };
    store.save_crawl_summary(&summary).await.unwrap();
    // Same session id again: summaries are replaced, not duplicated.
    store.save_crawl_summary(&summary).await.unwrap();
}
