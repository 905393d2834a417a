//! Crawl-level error taxonomy
//!
//! Per-page and per-container failures are swallowed with logging inside the
//! crawl loop; only the outcomes below propagate to the caller, each mapped
//! to the HTTP status the routing collaborator should answer with.

use thiserror::Error;

use crate::infrastructure::http_client::FetchError;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("invalid crawl URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("no products found on this website - try a product listing page")]
    ZeroProducts { pages_visited: u32 },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("crawl timed out after {seconds}s with no products")]
    Timeout { seconds: u64, pages_visited: u32 },

    #[error("failed to fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("storage failure")]
    Storage(#[source] anyhow::Error),
}

impl CrawlError {
    pub fn invalid_url(url: &str, reason: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// HTTP status code the routing collaborator should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidUrl { .. } | Self::ZeroProducts { .. } => 400,
            Self::Configuration { .. } | Self::Fetch { .. } | Self::Storage(_) => 500,
            Self::Timeout { .. } => 504,
        }
    }
}

pub type CrawlResult<T> = Result<T, CrawlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_the_external_contract() {
        assert_eq!(CrawlError::invalid_url("x", "no scheme").status_code(), 400);
        assert_eq!(CrawlError::ZeroProducts { pages_visited: 3 }.status_code(), 400);
        assert_eq!(CrawlError::configuration("missing key").status_code(), 500);
        assert_eq!(
            CrawlError::Timeout { seconds: 90, pages_visited: 2 }.status_code(),
            504
        );
        assert_eq!(
            CrawlError::Storage(anyhow::anyhow!("disk full")).status_code(),
            500
        );
    }
}
