//! Single-call adapter over batches, the apartment worker and completion signals.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use crate::apartment::ApartmentWorker;
use crate::batch::ShellOperationBatch;
use crate::completion::CompletionSignal;
use crate::engine::{ItemEvent, ItemOperation, OperationKind, OperationOptions, ShellEngine};
use crate::error::{FsOpsError, FsOpsResult};

/// Result of [`ShellOperations::perform_many`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Per-item events in queue order.
    pub events: Vec<ItemEvent>,
    /// Conjunction of the item results as resolved by the completion signal.
    pub success: bool,
}

/// Executes delete, rename, move and copy requests on the apartment worker.
#[derive(Clone)]
pub struct ShellOperations {
    worker: ApartmentWorker,
    engine: Arc<dyn ShellEngine>,
}

impl std::fmt::Debug for ShellOperations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellOperations")
            .field("worker", &self.worker)
            .finish_non_exhaustive()
    }
}

impl ShellOperations {
    /// Adapter running `engine` on `worker`.
    #[must_use]
    pub fn new(worker: ApartmentWorker, engine: Arc<dyn ShellEngine>) -> Self {
        Self { worker, engine }
    }

    /// Delete `path`, recycling unless `permanently`.
    pub async fn delete(&self, path: &Path, permanently: bool) -> bool {
        let item = ItemOperation::Delete {
            source: path.to_path_buf(),
        };
        self.single(item, OperationOptions::for_delete(permanently)).await
    }

    /// Rename `path` to `new_name` in its folder.
    pub async fn rename(&self, path: &Path, new_name: &str, overwrite: bool) -> bool {
        let item = ItemOperation::Rename {
            source: path.to_path_buf(),
            new_name: new_name.to_string(),
        };
        self.single(item, OperationOptions::for_transfer(overwrite)).await
    }

    /// Move `path` to the full destination path `destination`.
    pub async fn move_item(&self, path: &Path, destination: &Path, overwrite: bool) -> bool {
        match split_destination("shell.move", destination) {
            Ok((destination_dir, name)) => {
                let item = ItemOperation::Move {
                    source: path.to_path_buf(),
                    destination_dir,
                    name,
                };
                self.single(item, OperationOptions::for_transfer(overwrite)).await
            }
            Err(err) => {
                warn!(error = ?err, destination = %destination.display(), "move rejected");
                false
            }
        }
    }

    /// Copy `path` to the full destination path `destination`.
    pub async fn copy(&self, path: &Path, destination: &Path, overwrite: bool) -> bool {
        match split_destination("shell.copy", destination) {
            Ok((destination_dir, name)) => {
                let item = ItemOperation::Copy {
                    source: path.to_path_buf(),
                    destination_dir,
                    name,
                };
                self.single(item, OperationOptions::for_transfer(overwrite)).await
            }
            Err(err) => {
                warn!(error = ?err, destination = %destination.display(), "copy rejected");
                false
            }
        }
    }

    /// Queue `items` in one batch of `kind`, run it and await its completion.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::KindMismatch`] when an item's kind differs from
    /// `kind`, or a worker error when the apartment cannot run the batch.
    pub async fn perform_many(
        &self,
        kind: OperationKind,
        options: OperationOptions,
        items: Vec<ItemOperation>,
    ) -> FsOpsResult<BatchOutcome> {
        let mut batch = ShellOperationBatch::new(kind, options);
        for item in items {
            batch.queue(item)?;
        }
        let (mut signal, waiter) = CompletionSignal::new(batch.len());
        batch.on_post_item(move |event| signal.record(event.succeeded()));

        let engine = Arc::clone(&self.engine);
        let report = self
            .worker
            .run("shell.perform", move || batch.perform(engine.as_ref()))
            .await?;
        let completion = waiter.wait().await;
        Ok(BatchOutcome {
            events: report.events,
            success: completion.succeeded(),
        })
    }

    async fn single(&self, item: ItemOperation, options: OperationOptions) -> bool {
        let kind = item.kind();
        match self.perform_many(kind, options, vec![item]).await {
            Ok(outcome) => outcome.success,
            Err(err) => {
                warn!(kind = %kind, error = ?err, "shell batch failed to run");
                false
            }
        }
    }
}

fn split_destination(operation: &'static str, destination: &Path) -> FsOpsResult<(PathBuf, String)> {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            FsOpsError::invalid_input(operation, "destination", "no_leaf", destination.to_string_lossy())
        })?;
    let parent = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| {
            FsOpsError::invalid_input(operation, "destination", "no_parent", destination.to_string_lossy())
        })?;
    Ok((parent.to_path_buf(), name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_splits_into_folder_and_leaf() -> anyhow::Result<()> {
        let (dir, name) = split_destination("test", Path::new("/data/out/file.txt"))?;
        assert_eq!(dir, PathBuf::from("/data/out"));
        assert_eq!(name, "file.txt");
        Ok(())
    }

    #[test]
    fn destination_without_leaf_is_rejected() {
        let err = split_destination("test", Path::new("/")).expect_err("root");
        assert!(matches!(err, FsOpsError::InvalidInput { reason: "no_leaf", .. }));
        let err = split_destination("test", Path::new("bare")).expect_err("bare");
        assert!(matches!(err, FsOpsError::InvalidInput { reason: "no_parent", .. }));
    }
}
