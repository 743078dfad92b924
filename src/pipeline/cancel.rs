use std::sync::Arc;

use tokio::sync::watch;

/// Cooperative cancellation shared between a request and whoever may abort it.
///
/// Clones observe the same flag. Once cancelled a token stays cancelled.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<watch::Sender<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            cancelled: Arc::new(tx),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.cancelled.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel
        rx.wait_for(|cancelled| *cancelled).await.ok();
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
