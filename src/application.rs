//! Application layer module
//!
//! Use cases, transfer objects and the crawl-level error taxonomy that
//! orchestrate the domain logic for the routing collaborator.

pub mod crawling_use_cases;
pub mod dto;
pub mod error;

pub use crawling_use_cases::CrawlingUseCases;
pub use dto::{CrawlRequest, CrawlResponse};
pub use error::{CrawlError, CrawlResult};
