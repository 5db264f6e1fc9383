//! Error taxonomy shared by every layer of the client.

use thiserror::Error;

/// Errors that can occur while fetching, paginating or enriching records.
///
/// All variants are fail-fast: no partial results are returned once one of
/// these surfaces, and nothing in the library retries.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Upstream answered with a non-success status.
    #[error("HTTP {status} from {path}")]
    Http { status: u16, path: String },

    /// A response lacked the pagination metadata or shape it should carry.
    #[error("malformed page from {path}: {reason}")]
    MalformedPage { path: String, reason: String },

    /// A record could not be keyed or tagged.
    #[error("malformed record field '{field}': {reason}")]
    MalformedRecord { field: String, reason: String },

    /// Invalid selector or endpoint configuration, raised before any request.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport failure or undecodable body.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl ParleyError {
    pub(crate) fn malformed_page(path: &str, reason: impl Into<String>) -> Self {
        Self::MalformedPage {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_record(field: &str, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// HTTP status code, when the error came from an upstream response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
