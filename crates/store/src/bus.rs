//! Change notification plumbing.
//!
//! A context that writes to the shared store does not hear about its own
//! write; only *other* live contexts are notified, and only when they next
//! drain their subscription. The notification carries no payload; receivers
//! must re-read and re-validate whatever they care about.

use std::sync::mpsc::Receiver;
use std::time::Duration;

/// "Something in the shared store changed."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreChange;

/// One context's view of the notification stream.
///
/// Designed for single-threaded consumption; drain with `try_recv` at each
/// synchronization point.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything currently queued; `true` if anything was pending.
    pub fn drain(&self) -> bool {
        let mut any = false;
        while self.try_recv().is_ok() {
            any = true;
        }
        any
    }
}
