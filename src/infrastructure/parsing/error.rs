//! Extraction error types for HTML product parsing
//!
//! Per-container failures are recoverable: the container is skipped and the
//! page keeps being processed. Only a page yielding no containers at all is
//! reported upward.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ExtractionError {
    #[error("required field '{field}' not found in container")]
    RequiredFieldMissing {
        field: String,
        context: Option<String>,
    },

    #[error("invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("no product containers found on page")]
    NoProductsFound { tried_selectors: Vec<String> },

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolutionFailed {
        url: String,
        reason: String,
        base_url: Option<String>,
    },
}

impl ExtractionError {
    pub fn required_field_missing(field: &str, context: Option<&str>) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
            context: context.map(|s| s.to_string()),
        }
    }

    pub fn invalid_selector(selector: &str, reason: &str) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn no_products_found(tried_selectors: Vec<String>) -> Self {
        Self::NoProductsFound { tried_selectors }
    }

    /// Whether processing can continue past this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::RequiredFieldMissing { .. } => true,
            Self::UrlResolutionFailed { .. } => true,
            Self::NoProductsFound { .. } => false,
            Self::InvalidSelector { .. } => false,
        }
    }
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;
