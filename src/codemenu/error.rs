//! Error types for CodeMenu API calls.
//!
//! Every outbound request ends in either a [`Payload`](super::Payload) or one
//! of these categories. The dispatcher turns them into tool error results, so
//! the messages here are what the AI assistant ends up reading.
//!
//! URLs stored in errors never carry a query string, which is where the API
//! key travels under the default authentication scheme.

use thiserror::Error;
use url::Url;

/// Result type for CodeMenu API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur when talking to the CodeMenu API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, timeout, ...).
    #[error(
        "Network error connecting to CodeMenu API at {url}. \
         Make sure CodeMenu is running and the API is enabled in settings."
    )]
    Unreachable {
        /// Endpoint that was being called, without query string.
        url: Url,
        /// The underlying HTTP client error (URL stripped).
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("CodeMenu API error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body as returned by CodeMenu.
        body: String,
    },

    /// No snippet with the requested identifier exists.
    #[error("Snippet with ID {id} not found")]
    SnippetNotFound {
        /// The identifier that was looked up.
        id: String,
    },

    /// The response body could not be read.
    #[error("failed to read CodeMenu API response from {url}: {source}")]
    Body {
        /// Endpoint that was being called, without query string.
        url: Url,
        /// The underlying HTTP client error (URL stripped).
        #[source]
        source: reqwest::Error,
    },

    /// The response did not have the expected shape.
    #[error("unexpected response from CodeMenu API at {url}: {reason}")]
    UnexpectedShape {
        /// Endpoint that was being called, without query string.
        url: Url,
        /// What was wrong with it.
        reason: String,
    },

    /// An identifier would not survive as its own path segment.
    #[error("'{segment}' is not a valid identifier")]
    InvalidSegment {
        /// The rejected value.
        segment: String,
    },

    /// Endpoint paths cannot be appended to the configured base URL.
    #[error("CodeMenu API base URL cannot have endpoint paths appended")]
    InvalidBaseUrl,

    /// The API key cannot be sent as an HTTP header value.
    #[error("CodeMenu API key contains characters that are not allowed in an HTTP header")]
    InvalidApiKey,

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    /// Returns `true` if the request was never answered by CodeMenu.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}
