//! Per-hop deadline around a pending transport call.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::cancel::CancelHandle;
use crate::error::{FetchError, Result, TransportError};
use crate::http::Response;

/// Race `pending` against `timeout`.
///
/// Without a timeout the call is awaited as-is. On expiry the handle is
/// cancelled unless something already cancelled it, and the call fails
/// immediately; the transport is expected to notice the handle on its own.
pub async fn guard<F>(
    pending: F,
    timeout: Option<Duration>,
    cancel: Option<&Arc<dyn CancelHandle>>,
) -> Result<Response>
where
    F: Future<Output = std::result::Result<Response, TransportError>>,
{
    let Some(after) = timeout else {
        return pending.await.map_err(FetchError::Transport);
    };

    match tokio::time::timeout(after, pending).await {
        Ok(result) => result.map_err(FetchError::Transport),
        Err(_) => {
            if let Some(handle) = cancel {
                if !handle.is_cancelled() {
                    handle.cancel();
                }
            }
            tracing::warn!(
                timeout = ?after,
                has_handle = cancel.is_some(),
                "request deadline exceeded"
            );
            Err(FetchError::Timeout { after })
        }
    }
}
