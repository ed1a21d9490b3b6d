//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Counts requests by `fileop` and operation outcomes by kind.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{CollectorStage, Result, TelemetryError};

/// Outcome label recorded for a completed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The operation reported success.
    Succeeded,
    /// The operation reported an expected failure.
    Failed,
}

impl Outcome {
    /// Label value for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// Map a boolean result to an outcome.
    #[must_use]
    pub const fn from_success(succeeded: bool) -> Self {
        if succeeded {
            Self::Succeeded
        } else {
            Self::Failed
        }
    }
}

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    requests_total: IntCounterVec,
    operation_outcomes_total: IntCounterVec,
    decode_failures_total: IntCounter,
    ignored_requests_total: IntCounter,
    handler_failures_total: IntCounter,
}

/// Snapshot of selected counters for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Requests that failed to decode.
    pub decode_failures_total: u64,
    /// Requests passed over without a response.
    pub ignored_requests_total: u64,
    /// Requests whose handler failed unexpectedly.
    pub handler_failures_total: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("requests_total", "File-operation requests received by kind"),
            &["fileop"],
        )
        .map_err(|source| collector("requests_total", source))?;
        let operation_outcomes_total = IntCounterVec::new(
            Opts::new(
                "operation_outcomes_total",
                "Completed file operations by kind and outcome",
            ),
            &["kind", "outcome"],
        )
        .map_err(|source| collector("operation_outcomes_total", source))?;
        let decode_failures_total = IntCounter::with_opts(Opts::new(
            "decode_failures_total",
            "Requests rejected because a field failed to decode",
        ))
        .map_err(|source| collector("decode_failures_total", source))?;
        let ignored_requests_total = IntCounter::with_opts(Opts::new(
            "ignored_requests_total",
            "Requests for other handlers or unknown kinds",
        ))
        .map_err(|source| collector("ignored_requests_total", source))?;
        let handler_failures_total = IntCounter::with_opts(Opts::new(
            "handler_failures_total",
            "Requests whose handler failed unexpectedly",
        ))
        .map_err(|source| collector("handler_failures_total", source))?;

        register(&registry, "requests_total", requests_total.clone())?;
        register(
            &registry,
            "operation_outcomes_total",
            operation_outcomes_total.clone(),
        )?;
        register(&registry, "decode_failures_total", decode_failures_total.clone())?;
        register(&registry, "ignored_requests_total", ignored_requests_total.clone())?;
        register(&registry, "handler_failures_total", handler_failures_total.clone())?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                requests_total,
                operation_outcomes_total,
                decode_failures_total,
                ignored_requests_total,
                handler_failures_total,
            }),
        })
    }

    /// Increment the request counter for the given `fileop`.
    pub fn inc_request(&self, fileop: &str) {
        self.inner.requests_total.with_label_values(&[fileop]).inc();
    }

    /// Record the outcome of a completed operation.
    pub fn record_outcome(&self, kind: &str, outcome: Outcome) {
        self.inner
            .operation_outcomes_total
            .with_label_values(&[kind, outcome.as_str()])
            .inc();
    }

    /// Increment the decode failure counter.
    pub fn inc_decode_failure(&self) {
        self.inner.decode_failures_total.inc();
    }

    /// Increment the ignored request counter.
    pub fn inc_ignored(&self) {
        self.inner.ignored_requests_total.inc();
    }

    /// Increment the handler failure counter.
    pub fn inc_handler_failure(&self) {
        self.inner.handler_failures_total.inc();
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::Render { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::RenderUtf8 { source })
    }

    /// Take a point-in-time snapshot of the failure counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            decode_failures_total: self.inner.decode_failures_total.get(),
            ignored_requests_total: self.inner.ignored_requests_total.get(),
            handler_failures_total: self.inner.handler_failures_total.get(),
        }
    }
}

const fn collector(name: &'static str, source: prometheus::Error) -> TelemetryError {
    TelemetryError::Collector {
        name,
        stage: CollectorStage::Build,
        source,
    }
}

fn register<C>(registry: &Registry, name: &'static str, collector: C) -> Result<()>
where
    C: prometheus::core::Collector + 'static,
{
    registry
        .register(Box::new(collector))
        .map_err(|source| TelemetryError::Collector {
            name,
            stage: CollectorStage::Register,
            source,
        })
}
