use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::internal::models::{Bitmap, ReferenceSource};
use crate::internal::resolver::{ResolveError, Resolver};

/// Handle to the one-shot reference resolution started when the overlay mounts.
///
/// Dropping the handle cancels the task, so a detached overlay never receives a
/// stale outcome.
pub struct ResolutionTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ResolutionTask {
    /// Spawn the resolution on the current runtime. The outcome is mapped through
    /// `into_message` and sent once on `tx`.
    pub fn spawn<M, F>(
        resolver: Resolver,
        source: ReferenceSource,
        credential: String,
        tx: UnboundedSender<M>,
        into_message: F,
    ) -> Self
    where
        M: Send + 'static,
        F: FnOnce(Result<Bitmap, ResolveError>) -> M + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("Reference resolution cancelled");
                    return;
                }
                outcome = resolver.resolve(&source, &credential) => outcome,
            };

            if let Err(e) = &outcome {
                tracing::error!("Reference resolution failed: {}", e);
            }
            if tx.send(into_message(outcome)).is_err() {
                tracing::debug!("Overlay detached before resolution finished");
            }
        });

        Self { cancel, handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ResolutionTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
