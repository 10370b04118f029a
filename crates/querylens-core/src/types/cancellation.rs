//! Cancellation token threaded through provider and engine calls

use std::sync::Arc;

use tokio::sync::watch;

/// Cooperative cancellation for in-flight requests.
///
/// Clones share state: cancelling any clone cancels them all. Backend calls
/// check the token between network round-trips so a cancelled tool call
/// unwinds promptly instead of running its query to completion.
#[derive(Clone)]
pub struct CancellationToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Wait until cancellation is requested. Resolves immediately if it
    /// already was.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // the sender lives in self, so wait_for cannot fail
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("is_cancelled", &self.is_cancelled())
            .finish()
    }
}
