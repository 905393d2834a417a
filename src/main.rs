//! Shopcrawl CLI - crawl a storefront and persist its product catalog
//!
//! Usage: shopcrawl <url> [max_pages]

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use shopcrawl_lib::application::{CrawlRequest, CrawlingUseCases};
use shopcrawl_lib::domain::repositories::CatalogStore;
use shopcrawl_lib::infrastructure::{
    ConfigManager, DatabaseConnection, ProductRepository, init_logging_with_config,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let Some(url) = args.get(1).cloned() else {
        eprintln!("Usage: shopcrawl <url> [max_pages]");
        std::process::exit(2);
    };
    let max_pages: Option<u32> = args.get(2).map(|s| s.parse()).transpose().map_err(|_| {
        anyhow::anyhow!("max_pages must be a positive integer, got {:?}", args[2])
    })?;

    // 1. Configuration
    let config_manager = ConfigManager::new()?;
    let config = config_manager.load_config().await?;
    init_logging_with_config(&config.user.logging)?;
    info!("Loaded configuration from {:?}", config_manager.config_path());

    // 2. Database and repository
    let db = DatabaseConnection::new(&config.advanced.database_url).await?;
    db.migrate().await?;
    let repository = Arc::new(ProductRepository::new(db.pool().clone()));

    // 3. Crawl pipeline
    let store: Arc<dyn CatalogStore> = repository.clone();
    let use_cases = CrawlingUseCases::from_config(config, store)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let mut request = CrawlRequest::new(&url);
    request.max_pages = max_pages;

    println!("Crawling {url} ...");
    match use_cases.crawl_site(request).await {
        Ok(response) => {
            let total = repository.count_products(&response.business_id).await?;
            println!("{}", response.message);
            println!(
                "Business {} now holds {} products",
                response.business_id, total
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("Crawl failed ({}): {e}", e.status_code());
            std::process::exit(1);
        }
    }
}
