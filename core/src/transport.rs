//! The transport seam.
//!
//! A transport turns one `Request` into one `Response`. It may follow
//! redirects itself when `request.redirect` is `Follow`, but must return 3xx
//! responses untouched for `Manual`. Non-2xx statuses are data, not errors;
//! only connection-level failures should surface as `Err`.

use futures_util::future::BoxFuture;

use crate::error::TransportError;
use crate::http::{Request, Response};

pub trait Transport: Send + Sync {
    fn send(&self, request: Request) -> BoxFuture<'_, Result<Response, TransportError>>;
}
