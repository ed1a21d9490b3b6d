//! Long-lived collaborators shared by every request handler.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use filebroker_config::BrokerConfig;
use filebroker_fsops::{
    ApartmentWorker, ClipboardBridge, ClipboardStore, LocalShellEngine, RecycleBin,
    ShellEngine, ShellOperations, StagingRecycleBin, SystemClipboard, SystemRecycleBin,
};
use filebroker_permissions::{PermissionsEngine, platform_engine};
use filebroker_telemetry::Metrics;

use crate::error::{AppError, AppResult};

/// Name of the thread that owns clipboard and shell-engine calls.
pub const APARTMENT_THREAD: &str = "filebroker-apartment";

/// Handler dependencies.
#[derive(Clone)]
pub struct Services {
    /// Delete, rename, move and copy.
    pub shell: ShellOperations,
    /// Clipboard publishing and drop receiving.
    pub clipboard: ClipboardBridge,
    /// Worker that also runs shortcut writes.
    pub worker: ApartmentWorker,
    /// Permission backend.
    pub permissions: Arc<dyn PermissionsEngine>,
    /// Request and outcome counters.
    pub metrics: Metrics,
    /// Bound on shortcut target resolution.
    pub link_resolve_timeout: Duration,
    /// Answer link writes with `Success`.
    pub acknowledge_link_writes: bool,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("shell", &self.shell)
            .field("worker", &self.worker)
            .field("link_resolve_timeout", &self.link_resolve_timeout)
            .field("acknowledge_link_writes", &self.acknowledge_link_writes)
            .finish_non_exhaustive()
    }
}

impl Services {
    /// Production wiring: the desktop clipboard, the OS recycle bin (or the
    /// configured staging directory) and the platform permission backend.
    ///
    /// # Errors
    ///
    /// Returns an error when the apartment worker cannot be started.
    pub fn from_config(config: &BrokerConfig, metrics: Metrics) -> AppResult<Self> {
        Self::with_clipboard(config, metrics, Arc::new(SystemClipboard::new()))
    }

    /// Wiring over a caller-supplied clipboard store.
    ///
    /// # Errors
    ///
    /// Returns an error when the apartment worker cannot be started.
    pub fn with_clipboard(
        config: &BrokerConfig,
        metrics: Metrics,
        clipboard: Arc<dyn ClipboardStore>,
    ) -> AppResult<Self> {
        let worker = ApartmentWorker::spawn(APARTMENT_THREAD)
            .map_err(|err| AppError::fsops("apartment.spawn", err))?;
        let recycle: Arc<dyn RecycleBin> = match &config.recycle_dir {
            Some(dir) => Arc::new(StagingRecycleBin::new(dir.clone())),
            None => Arc::new(SystemRecycleBin),
        };
        let engine: Arc<dyn ShellEngine> = Arc::new(LocalShellEngine::new(recycle));
        Ok(Self {
            shell: ShellOperations::new(worker.clone(), engine),
            clipboard: ClipboardBridge::new(worker.clone(), clipboard),
            worker,
            permissions: platform_engine(),
            metrics,
            link_resolve_timeout: config.link_resolve_timeout,
            acknowledge_link_writes: config.acknowledge_link_writes,
        })
    }
}
