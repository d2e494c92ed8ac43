//! Cancellation capability injected per call.
//!
//! The pipeline only ever flips a handle; observing it and aborting the
//! network operation is the transport's job.

use std::fmt::Debug;

use tokio_util::sync::CancellationToken;

pub trait CancelHandle: Send + Sync + Debug {
    fn cancel(&self);
    fn is_cancelled(&self) -> bool;
}

impl CancelHandle for CancellationToken {
    fn cancel(&self) {
        CancellationToken::cancel(self)
    }

    fn is_cancelled(&self) -> bool {
        CancellationToken::is_cancelled(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn token_as_handle() {
        let token = CancellationToken::new();
        let handle: Arc<dyn CancelHandle> = Arc::new(token.clone());
        assert!(!handle.is_cancelled());
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(token.is_cancelled());
    }
}
