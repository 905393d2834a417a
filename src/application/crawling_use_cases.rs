//! Crawl orchestration
//!
//! Coordinates the HTTP client, page classifier, extractors, link frontier
//! and catalog store into the complete crawl workflow: fetch -> classify ->
//! extract -> enqueue, one page at a time, under a page budget and an
//! end-to-end deadline. A crawl that runs out of time keeps whatever it
//! accumulated.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use scraper::Html;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::application::dto::{CrawlRequest, CrawlResponse};
use crate::application::error::{CrawlError, CrawlResult};
use crate::domain::product::{BusinessRecord, ProductAggregator, ProductRecord};
use crate::domain::repositories::CatalogStore;
use crate::domain::session::{CrawlSession, CrawlSummary};
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::parsing::{
    ContextualParser, ExtractionError, ParseContext, ProductListParser, classifier, extract_links,
};
use crate::infrastructure::product_feed::ProductFeedClient;
use crate::infrastructure::{AppConfig, PageKind};

/// High-level crawling use cases.
pub struct CrawlingUseCases {
    http_client: Arc<HttpClient>,
    list_parser: ProductListParser,
    feed_client: ProductFeedClient,
    store: Arc<dyn CatalogStore>,
    config: AppConfig,
}

/// What one crawled page contributed.
struct PageOutcome {
    records: Vec<ProductRecord>,
    store_name: Option<String>,
    links: Vec<String>,
}

impl CrawlingUseCases {
    /// Wire up the crawl pipeline from an application configuration.
    pub fn from_config(config: AppConfig, store: Arc<dyn CatalogStore>) -> CrawlResult<Self> {
        let http_client = Arc::new(
            HttpClient::new(config.http_client_config())
                .map_err(|e| CrawlError::configuration(e.to_string()))?,
        );
        let list_parser = ProductListParser::new()
            .map_err(|e| CrawlError::configuration(e.to_string()))?;
        let feed_client = ProductFeedClient::new(Arc::clone(&http_client));
        Ok(Self {
            http_client,
            list_parser,
            feed_client,
            store,
            config,
        })
    }

    /// Run a crawl to completion.
    pub async fn crawl_site(&self, request: CrawlRequest) -> CrawlResult<CrawlResponse> {
        self.crawl_site_with_cancellation(request, CancellationToken::new())
            .await
    }

    /// Run a crawl, stopping early (keeping accumulated products) when the
    /// token is cancelled.
    pub async fn crawl_site_with_cancellation(
        &self,
        request: CrawlRequest,
        cancel: CancellationToken,
    ) -> CrawlResult<CrawlResponse> {
        let seed = parse_seed(&request.url)?;
        let max_pages = request.max_pages.unwrap_or(self.config.user.max_pages) as usize;
        let max_products = self.config.user.max_products_per_page as usize;
        let deadline =
            Instant::now() + Duration::from_secs(self.config.user.crawl_timeout_seconds);

        let session_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        info!(
            "Starting crawl {session_id} of {seed} (max {max_pages} pages, budget {}s)",
            self.config.user.crawl_timeout_seconds
        );

        let mut session = CrawlSession::new(&seed, max_pages);
        let mut aggregator = ProductAggregator::new();
        let mut store_name: Option<String> = None;
        let mut first_fetch_error = None;
        let mut pages_fetched = 0u32;
        let mut timed_out = false;
        let mut cancelled = false;

        while let Some(url) = session.next_url() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if Instant::now() >= deadline {
                timed_out = true;
                break;
            }

            let html_text = match self
                .http_client
                .fetch_html_with_cancellation(&url, cancel.clone())
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping {url}: {e}");
                    if first_fetch_error.is_none() {
                        first_fetch_error = Some((url.clone(), e));
                    }
                    continue;
                }
            };
            pages_fetched += 1;

            let Ok(page_url) = Url::parse(&url) else {
                continue;
            };
            let outcome = self
                .process_page(&page_url, &html_text, max_products)
                .await;
            if store_name.is_none() {
                store_name = outcome.store_name;
            }
            for href in &outcome.links {
                session.enqueue_link(&page_url, href);
            }
            let mut kept = 0usize;
            let found = outcome.records.len();
            for record in outcome.records {
                if aggregator.push(record) {
                    kept += 1;
                }
            }
            debug!(
                "Page {url}: {found} extracted, {kept} new, {} total",
                aggregator.len()
            );

            if self.config.user.request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.user.request_delay_ms))
                    .await;
            }
        }

        let pages_visited = session.pages_visited() as u32;
        let records = aggregator.into_records();
        info!(
            "Crawl {session_id} finished: {} pages, {} unique products{}",
            pages_visited,
            records.len(),
            if timed_out { " (deadline reached)" } else { "" }
        );

        if records.is_empty() {
            let status = if timed_out {
                "timed_out"
            } else if cancelled {
                "cancelled"
            } else {
                "no_products"
            };
            self.finish_summary(&session_id, None, &request.url, pages_visited, 0, status, started_at)
                .await;

            if timed_out {
                return Err(CrawlError::Timeout {
                    seconds: self.config.user.crawl_timeout_seconds,
                    pages_visited,
                });
            }
            if pages_fetched == 0 {
                if let Some((url, source)) = first_fetch_error {
                    return Err(CrawlError::Fetch { url, source });
                }
            }
            return Err(CrawlError::ZeroProducts { pages_visited });
        }

        // Persist: the business row and its products are one logical unit;
        // the business is never written without at least one product.
        let business_id = request
            .business_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let business_name = request
            .business_name
            .clone()
            .or(store_name)
            .unwrap_or_else(|| "Business".to_string());

        let business = BusinessRecord {
            id: business_id.clone(),
            name: business_name,
            source_url: request.url.clone(),
            created_at: Utc::now(),
        };
        self.store
            .insert_business(&business)
            .await
            .map_err(CrawlError::Storage)?;

        let stamped: Vec<ProductRecord> = records
            .into_iter()
            .map(|mut record| {
                record.business_id = Some(business_id.clone());
                record
            })
            .collect();

        // Best-effort batching: a failed batch is reported but earlier
        // batches stand.
        let batch_size = self.config.user.batch_size.max(1) as usize;
        let mut inserted = 0u32;
        let mut failed_batches = 0u32;
        for batch in stamped.chunks(batch_size) {
            match self.store.insert_products(batch).await {
                Ok(()) => inserted += batch.len() as u32,
                Err(e) => {
                    failed_batches += 1;
                    warn!("Product batch of {} failed: {e:#}", batch.len());
                }
            }
        }
        if inserted == 0 {
            return Err(CrawlError::Storage(anyhow::anyhow!(
                "all {failed_batches} product batches failed"
            )));
        }

        let status = if timed_out {
            "timed_out"
        } else if cancelled {
            "cancelled"
        } else {
            "completed"
        };
        self.finish_summary(
            &session_id,
            Some(business_id.clone()),
            &request.url,
            pages_visited,
            inserted,
            status,
            started_at,
        )
        .await;

        let mut message = format!("Successfully crawled {inserted} products");
        if failed_batches > 0 {
            message.push_str(&format!(" ({failed_batches} batches failed)"));
        }
        Ok(CrawlResponse {
            business_id,
            products_found: inserted,
            message,
        })
    }

    /// Extract everything one page has to offer. Extraction failures are
    /// recovered here; a page that yields nothing is just an empty outcome.
    async fn process_page(
        &self,
        page_url: &Url,
        html_text: &str,
        max_products: usize,
    ) -> PageOutcome {
        // The parsed document must not cross an await point (it is not
        // Send); only records, links and metadata leave this block.
        let (kind, store_name, links, heuristic) = {
            let document = Html::parse_document(html_text);
            let kind = classifier::classify(page_url, &document);
            let store_name = classifier::store_name(&document);
            let links = extract_links(&document);
            let context =
                ParseContext::new(page_url.clone()).with_max_products(max_products);
            let heuristic = match self.list_parser.parse_with_context(&document, &context) {
                Ok(records) => records,
                Err(ExtractionError::NoProductsFound { tried_selectors }) => {
                    debug!("No containers on {page_url} (tried {tried_selectors:?})");
                    Vec::new()
                }
                Err(e) => {
                    warn!("Extraction failed on {page_url}: {e}");
                    Vec::new()
                }
            };
            (kind, store_name, links, heuristic)
        };

        // Product pages go through the structured feed first; the heuristic
        // pass is the fallback there and the primary path everywhere else.
        let mut records = Vec::new();
        match kind {
            PageKind::Product => {
                if let Some(record) = self.feed_client.fetch_product(page_url).await {
                    records.push(record);
                } else {
                    records.extend(heuristic);
                }
            }
            PageKind::Listing => records.extend(heuristic),
        }

        PageOutcome {
            records,
            store_name: Some(store_name),
            links,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn finish_summary(
        &self,
        session_id: &str,
        business_id: Option<String>,
        start_url: &str,
        pages_visited: u32,
        products_found: u32,
        status: &str,
        started_at: chrono::DateTime<Utc>,
    ) {
        let summary = CrawlSummary {
            session_id: session_id.to_string(),
            business_id,
            start_url: start_url.to_string(),
            pages_visited,
            products_found,
            status: status.to_string(),
            started_at,
            completed_at: Utc::now(),
        };
        if let Err(e) = self.store.save_crawl_summary(&summary).await {
            warn!("Failed to save crawl summary {session_id}: {e:#}");
        }
    }
}

/// Validate and parse the seed URL.
fn parse_seed(url: &str) -> CrawlResult<Url> {
    let parsed =
        Url::parse(url.trim()).map_err(|e| CrawlError::invalid_url(url, &e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CrawlError::invalid_url(url, "URL must use http or https"));
    }
    if parsed.host_str().is_none() {
        return Err(CrawlError::invalid_url(url, "URL has no host"));
    }
    Ok(parsed)
}
