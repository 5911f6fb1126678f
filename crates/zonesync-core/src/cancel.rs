// # Cancellation
//
// A pass-wide cancellation signal. Zone submissions already in flight run
// to completion; zones that have not started yet are skipped and reported
// as cancelled.

use tokio::sync::watch;

/// Receiving side of a cancellation signal; cheap to clone
#[derive(Debug, Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

/// Sending side of a cancellation signal
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Create a linked handle / signal pair
pub fn cancellation() -> (CancelHandle, Cancellation) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, Cancellation { rx })
}

impl Cancellation {
    /// A signal that never fires
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until cancellation is requested
    ///
    /// Never resolves if the handle is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl CancelHandle {
    /// Request cancellation
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_stays_clear() {
        assert!(!Cancellation::never().is_cancelled());
    }

    #[tokio::test]
    async fn cancel_is_seen_by_every_clone() {
        let (handle, signal) = cancellation();
        let mut waiter = signal.clone();
        assert!(!signal.is_cancelled());

        handle.cancel();

        assert!(signal.is_cancelled());
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter.cancelled())
            .await
            .expect("cancelled() resolves after cancel()");
    }
}
