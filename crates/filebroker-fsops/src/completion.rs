//! Single-resolution completion primitive for batch post-item events.

use tokio::sync::oneshot;

/// Outcome observed by a [`CompletionWaiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Every expected item reported; `true` when all of them succeeded.
    Completed(bool),
    /// The signal was dropped before every expected item reported.
    Aborted,
}

impl Completion {
    /// Whether the batch completed and every item succeeded.
    #[must_use]
    pub const fn succeeded(self) -> bool {
        matches!(self, Self::Completed(true))
    }
}

/// Producer side: records post-item results until the expected count is reached.
///
/// Resolves at most once. Records after resolution are ignored. Dropping an
/// unresolved signal aborts the waiter.
#[derive(Debug)]
pub struct CompletionSignal {
    remaining: usize,
    all_succeeded: bool,
    sender: Option<oneshot::Sender<bool>>,
}

/// Consumer side of a [`CompletionSignal`].
#[derive(Debug)]
pub struct CompletionWaiter {
    receiver: oneshot::Receiver<bool>,
}

impl CompletionSignal {
    /// Create a signal expecting `expected` post-item events.
    ///
    /// A signal expecting zero events is resolved immediately with success.
    #[must_use]
    pub fn new(expected: usize) -> (Self, CompletionWaiter) {
        let (sender, receiver) = oneshot::channel();
        let mut signal = Self {
            remaining: expected,
            all_succeeded: true,
            sender: Some(sender),
        };
        if expected == 0 {
            signal.resolve();
        }
        (signal, CompletionWaiter { receiver })
    }

    /// Record one post-item result.
    pub fn record(&mut self, succeeded: bool) {
        if self.sender.is_none() {
            return;
        }
        self.all_succeeded &= succeeded;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.resolve();
        }
    }

    /// Whether the signal has already resolved.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.sender.is_none()
    }

    fn resolve(&mut self) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(self.all_succeeded);
        }
    }
}

impl CompletionWaiter {
    /// Wait for the signal to resolve or be dropped.
    pub async fn wait(self) -> Completion {
        self.receiver
            .await
            .map_or(Completion::Aborted, Completion::Completed)
    }
}
