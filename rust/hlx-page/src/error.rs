//! Error types for page and block decoration

use hlx_dom::DomError;
use thiserror::Error;

/// Failures of page-level decoration and loading
#[derive(Debug, Error)]
pub enum PageError {
    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("Invalid page location {location}: {source}")]
    InvalidLocation {
        location: String,
        source: url::ParseError,
    },

    #[error("Missing required element: {0}")]
    MissingElement(&'static str),
}

/// Failures reported by a block decorator
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("No decorator registered for block '{0}'")]
    UnknownBlock(String),

    #[error("Block '{block}' has no {element}")]
    MissingElement {
        block: String,
        element: &'static str,
    },

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),
}
