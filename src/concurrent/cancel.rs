//! Cooperative cancellation built on channel disconnection.
//!
//! A `CancelSource` owns the only sender of a channel that never carries a
//! message. Cancelling drops that sender, which makes every clone of the
//! matching `CancelToken` observe a disconnect. Because the token is a plain
//! `Receiver`, blocking code can `select!` on it alongside its real work.

use crossbeam_channel::{bounded, select, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;

use crate::error::AgentError;

/// Read side of a cancellation signal.
#[derive(Clone, Debug)]
pub struct CancelToken {
    signal: Receiver<()>,
}

impl CancelToken {
    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.signal.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// The raw signal, for use in `select!`.
    #[must_use]
    pub fn signal(&self) -> &Receiver<()> {
        &self.signal
    }
}

/// Write side of a cancellation signal.
#[derive(Debug)]
pub struct CancelSource {
    trigger: Mutex<Option<Sender<()>>>,
    token: CancelToken,
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSource {
    /// Create an untriggered source.
    #[must_use]
    pub fn new() -> Self {
        let (trigger, signal) = bounded(0);
        Self {
            trigger: Mutex::new(Some(trigger)),
            token: CancelToken { signal },
        }
    }

    /// A token observing this source.
    #[must_use]
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.trigger.lock().take();
    }

    /// Whether `cancel` has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.trigger.lock().is_none()
    }
}

/// Block on `rx` until a value arrives or `token` is cancelled.
pub fn recv_or_cancel<T>(rx: &Receiver<T>, token: &CancelToken) -> Result<T, AgentError> {
    select! {
        recv(rx) -> msg => msg.map_err(|_| AgentError::Disconnected),
        recv(token.signal()) -> _ => Err(AgentError::Interrupted),
    }
}

/// Block sending `value` on `tx` until it is taken or `token` is cancelled.
pub fn send_or_cancel<T>(tx: &Sender<T>, value: T, token: &CancelToken) -> Result<(), AgentError> {
    select! {
        send(tx, value) -> res => res.map_err(|_| AgentError::Disconnected),
        recv(token.signal()) -> _ => Err(AgentError::Interrupted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_cancel_is_observed_by_all_tokens() {
        let source = CancelSource::new();
        let a = source.token();
        let b = a.clone();
        assert!(!a.is_cancelled());

        source.cancel();
        source.cancel();
        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
        assert!(source.is_cancelled());
    }

    #[test]
    fn test_recv_or_cancel_returns_value() {
        let source = CancelSource::new();
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(5).unwrap();
        assert_eq!(recv_or_cancel(&rx, &source.token()), Ok(5));
    }

    #[test]
    fn test_recv_or_cancel_unblocks_on_cancel() {
        let source = std::sync::Arc::new(CancelSource::new());
        let token = source.token();
        let (_tx, rx) = crossbeam_channel::unbounded::<u8>();

        let canceller = {
            let source = std::sync::Arc::clone(&source);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                source.cancel();
            })
        };

        assert_eq!(recv_or_cancel(&rx, &token), Err(AgentError::Interrupted));
        canceller.join().unwrap();
    }

    #[test]
    fn test_recv_or_cancel_reports_disconnect() {
        let source = CancelSource::new();
        let (tx, rx) = crossbeam_channel::unbounded::<u8>();
        drop(tx);
        assert_eq!(recv_or_cancel(&rx, &source.token()), Err(AgentError::Disconnected));
    }

    #[test]
    fn test_send_or_cancel_unblocks_on_cancel() {
        let source = CancelSource::new();
        let token = source.token();
        let (tx, _rx) = crossbeam_channel::bounded::<u8>(0);
        source.cancel();
        assert_eq!(send_or_cancel(&tx, 1, &token), Err(AgentError::Interrupted));
    }
}
