//! Error types for the request pipeline.
//!
//! # Design
//! Every variant is terminal for the current call; nothing in the pipeline
//! retries. Transport failures are wrapped without rewriting so callers can
//! downcast to the transport's own error type.

use std::time::Duration;

use thiserror::Error;

/// Error produced by a `Transport` implementation.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The target was empty or missing. Raised before any I/O.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The per-hop deadline fired before the transport answered.
    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },

    /// A 3xx response arrived without a usable `location` header.
    #[error("redirect location is empty (status {status})")]
    RedirectLocationMissing { status: u16 },

    #[error("too many redirects (limit {max})")]
    TooManyRedirects { max: usize },

    /// Terminal non-2xx response outside raw mode.
    #[error("HTTP {status}")]
    HttpResponse {
        status: u16,
        headers: Vec<(String, String)>,
    },

    /// The response body did not match the requested data type.
    #[error("decoding failed: {0}")]
    Decode(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(#[source] TransportError),
}

impl FetchError {
    /// Status code carried by `HttpResponse`, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::HttpResponse { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}
