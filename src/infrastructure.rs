//! Infrastructure layer - HTTP, HTML parsing, persistence, configuration
//!
//! Concrete implementations behind the domain interfaces: the rate-limited
//! HTTP client, the heuristic and structured-feed extractors, the SQLite
//! catalog store, and configuration/logging plumbing.

pub mod config;
pub mod database_connection;
pub mod http_client;
pub mod logging;
pub mod parsing;
pub mod product_feed;
pub mod product_repository;

// Re-export public types
pub use config::{AppConfig, ConfigManager, defaults};
pub use database_connection::DatabaseConnection;
pub use http_client::{FetchError, HttpClient, HttpClientConfig, RenderingProxyConfig};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use parsing::{
    ContextualParser, ExtractionError, ExtractionResult, ListingSelectors, PageKind, ParseContext,
    ProductListParser,
};
pub use product_feed::ProductFeedClient;
pub use product_repository::ProductRepository;
