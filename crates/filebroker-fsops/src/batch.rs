//! Homogeneous shell operation batches.

use tracing::{debug, warn};

use crate::engine::{ItemEvent, ItemOperation, OperationKind, OperationOptions, ShellEngine};
use crate::error::{FsOpsError, FsOpsResult};

/// Callback invoked after every item, in queue order.
pub type PostItemCallback = Box<dyn FnMut(&ItemEvent) + Send>;

/// A batch of items sharing one kind and one set of options.
///
/// Items are independent: a failing item never stops the rest.
pub struct ShellOperationBatch {
    kind: OperationKind,
    options: OperationOptions,
    items: Vec<ItemOperation>,
    callbacks: Vec<PostItemCallback>,
}

/// Events produced by [`ShellOperationBatch::perform`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// One event per queued item.
    pub events: Vec<ItemEvent>,
}

impl BatchReport {
    /// Whether every item succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.events.iter().all(ItemEvent::succeeded)
    }
}

impl std::fmt::Debug for ShellOperationBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellOperationBatch")
            .field("kind", &self.kind)
            .field("options", &self.options)
            .field("items", &self.items)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

impl ShellOperationBatch {
    /// Empty batch of `kind`.
    #[must_use]
    pub const fn new(kind: OperationKind, options: OperationOptions) -> Self {
        Self {
            kind,
            options,
            items: Vec::new(),
            callbacks: Vec::new(),
        }
    }

    /// Kind of every item in this batch.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Options shared by every item.
    #[must_use]
    pub const fn options(&self) -> &OperationOptions {
        &self.options
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Queue an item.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::KindMismatch`] when the item's kind differs from the batch's.
    pub fn queue(&mut self, item: ItemOperation) -> FsOpsResult<()> {
        let found = item.kind();
        if found != self.kind {
            return Err(FsOpsError::KindMismatch {
                expected: self.kind,
                found,
            });
        }
        self.items.push(item);
        Ok(())
    }

    /// Register a post-item callback. Must happen before [`Self::perform`].
    pub fn on_post_item<F>(&mut self, callback: F)
    where
        F: FnMut(&ItemEvent) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Execute every item synchronously and fire callbacks after each one.
    ///
    /// Consumes the batch; callbacks are dropped when this returns.
    pub fn perform(mut self, engine: &dyn ShellEngine) -> BatchReport {
        let mut report = BatchReport {
            events: Vec::with_capacity(self.items.len()),
        };
        for (index, item) in self.items.iter().enumerate() {
            let outcome = engine.execute(item, &self.options);
            let event = ItemEvent {
                index,
                kind: self.kind,
                source: item.source().to_path_buf(),
                destination: outcome.clone().ok().flatten(),
                result: outcome.map(|_| ()),
            };
            match event.result {
                Ok(()) => debug!(
                    kind = %self.kind,
                    source = %event.source.display(),
                    destination = ?event.destination,
                    "shell item completed"
                ),
                Err(code) => warn!(
                    kind = %self.kind,
                    source = %event.source.display(),
                    code = code.as_str(),
                    "shell item failed"
                ),
            }
            for callback in &mut self.callbacks {
                callback(&event);
            }
            report.events.push(event);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{Completion, CompletionSignal};
    use crate::engine::FailureCode;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    struct ScriptedEngine;

    impl ShellEngine for ScriptedEngine {
        fn execute(
            &self,
            item: &ItemOperation,
            _options: &OperationOptions,
        ) -> Result<Option<PathBuf>, FailureCode> {
            if item.source().ends_with("missing") {
                Err(FailureCode::NotFound)
            } else {
                Ok(None)
            }
        }
    }

    fn delete(path: &str) -> ItemOperation {
        ItemOperation::Delete {
            source: PathBuf::from(path),
        }
    }

    #[test]
    fn queue_rejects_other_kinds() {
        let mut batch = ShellOperationBatch::new(OperationKind::Delete, OperationOptions::default());
        assert!(batch.queue(delete("/a")).is_ok());
        let err = batch
            .queue(ItemOperation::Rename {
                source: PathBuf::from("/a"),
                new_name: "b".to_string(),
            })
            .expect_err("mismatch");
        assert!(matches!(
            err,
            FsOpsError::KindMismatch {
                expected: OperationKind::Delete,
                found: OperationKind::Rename
            }
        ));
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn failing_item_does_not_stop_siblings() {
        let mut batch = ShellOperationBatch::new(OperationKind::Delete, OperationOptions::default());
        for path in ["/one", "/missing", "/three"] {
            assert!(batch.queue(delete(path)).is_ok());
        }
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        batch.on_post_item(move |event| {
            if let Ok(mut entries) = sink.lock() {
                entries.push((event.index, event.succeeded()));
            }
        });

        let report = batch.perform(&ScriptedEngine);

        assert!(!report.all_succeeded());
        assert_eq!(report.events.len(), 3);
        assert_eq!(report.events[1].result, Err(FailureCode::NotFound));
        assert_eq!(report.events[2].source, Path::new("/three"));
        let entries = seen.lock().map(|e| e.clone()).unwrap_or_default();
        assert_eq!(entries, vec![(0, true), (1, false), (2, true)]);
    }

    #[tokio::test]
    async fn completion_signal_tracks_post_item_events() {
        let mut batch = ShellOperationBatch::new(OperationKind::Delete, OperationOptions::default());
        assert!(batch.queue(delete("/one")).is_ok());
        assert!(batch.queue(delete("/two")).is_ok());
        let (mut signal, waiter) = CompletionSignal::new(batch.len());
        batch.on_post_item(move |event| signal.record(event.succeeded()));

        let report = batch.perform(&ScriptedEngine);
        assert!(report.all_succeeded());
        assert_eq!(waiter.wait().await, Completion::Completed(true));
    }

    #[tokio::test]
    async fn signal_expecting_more_items_aborts_when_batch_ends() {
        let mut batch = ShellOperationBatch::new(OperationKind::Delete, OperationOptions::default());
        assert!(batch.queue(delete("/only")).is_ok());
        let (mut signal, waiter) = CompletionSignal::new(2);
        batch.on_post_item(move |event| signal.record(event.succeeded()));

        let _ = batch.perform(&ScriptedEngine);
        assert_eq!(waiter.wait().await, Completion::Aborted);
    }
}
