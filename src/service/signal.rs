//! One-shot lifecycle signals.
//!
//! A [`Signal`] is resolved exactly once by its [`SignalSender`] and can be
//! cloned and awaited by any number of callers, before or after resolution.
//! Built on `tokio::sync::watch` so late waiters still observe the value.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{constants, ProtocolError};

/// Outcome carried by a signal. Errors are shared between all waiters.
pub type SignalResult<T> = std::result::Result<T, Arc<ProtocolError>>;

type Slot<T> = Option<SignalResult<T>>;

/// Resolving side of a [`Signal`].
pub struct SignalSender<T> {
    tx: watch::Sender<Slot<T>>,
}

/// Awaitable side; clones observe the same outcome.
pub struct Signal<T> {
    rx: watch::Receiver<Slot<T>>,
}

/// Create an unresolved signal.
pub fn signal<T: Clone>() -> (SignalSender<T>, Signal<T>) {
    let (tx, rx) = watch::channel(None);
    (SignalSender { tx }, Signal { rx })
}

impl<T: Clone> SignalSender<T> {
    /// Resolve the signal. Only the first call has an effect; returns whether
    /// this call was it.
    pub fn resolve(&self, outcome: SignalResult<T>) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(outcome);
            true
        })
    }

    pub fn succeed(&self, value: T) -> bool {
        self.resolve(Ok(value))
    }

    pub fn fail(&self, error: ProtocolError) -> bool {
        self.resolve(Err(Arc::new(error)))
    }
}

impl<T: Clone> Signal<T> {
    /// A signal that is already resolved.
    pub fn resolved(outcome: SignalResult<T>) -> Self {
        let (_, rx) = watch::channel(Some(outcome));
        Self { rx }
    }

    /// Current outcome, if resolved.
    pub fn try_get(&self) -> Option<SignalResult<T>> {
        self.rx.borrow().clone()
    }

    pub fn is_resolved(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait for the outcome.
    ///
    /// A sender dropped without resolving yields an error rather than
    /// waiting forever.
    pub async fn wait(&self) -> SignalResult<T> {
        let mut rx = self.rx.clone();
        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        };
        outcome.unwrap_or_else(|| {
            Err(Arc::new(ProtocolError::Custom(
                constants::ERR_SIGNAL_DROPPED.to_string(),
            )))
        })
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.rx.borrow().is_some() {
            "resolved"
        } else {
            "pending"
        };
        f.debug_struct("Signal").field("state", &state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_resolution_wins() {
        let (tx, rx) = signal::<u32>();
        let waiter = rx.clone();
        let task = tokio::spawn(async move { waiter.wait().await });

        assert!(tx.succeed(1));
        assert!(!tx.succeed(2));
        assert!(!tx.fail(ProtocolError::NotStarted));

        assert_eq!(task.await.unwrap().unwrap(), 1);
        assert_eq!(rx.wait().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_resolved_signal_is_ready() {
        let ready = Signal::resolved(Ok(()));
        assert!(ready.is_resolved());
        assert!(ready.wait().await.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_sender_reports_error() {
        let (tx, rx) = signal::<()>();
        drop(tx);
        assert!(rx.wait().await.is_err());
    }
}
