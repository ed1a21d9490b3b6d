//! Bounded classification of shortcut targets.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tokio::task;
use tracing::debug;

/// Whether `target` is a directory, or `None` when that cannot be determined
/// within `timeout` (missing target, unreachable share, slow media).
pub async fn target_is_directory(target: &str, timeout: Duration) -> Option<bool> {
    let path = PathBuf::from(target);
    let lookup = task::spawn_blocking(move || fs::metadata(&path).map(|meta| meta.is_dir()));
    match tokio::time::timeout(timeout, lookup).await {
        Ok(Ok(Ok(is_dir))) => Some(is_dir),
        Ok(Ok(Err(err))) => {
            debug!(link_target = target, error = %err, "shortcut target unavailable");
            None
        }
        Ok(Err(err)) => {
            debug!(link_target = target, error = %err, "shortcut target lookup aborted");
            None
        }
        Err(_) => {
            debug!(link_target = target, timeout = ?timeout, "shortcut target lookup timed out");
            None
        }
    }
}
