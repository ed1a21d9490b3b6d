//! Request decoding, routing and correlation.

use std::sync::Arc;

use filebroker_protocol::{Decoded, SUCCESS_KEY, Value, ValueSet, decode};
use filebroker_telemetry::{Outcome, request_span};
use tracing::{Instrument, trace, warn};

use crate::error::AppResult;
use crate::handlers;
use crate::services::Services;

/// Routes decoded requests to their handler.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    services: Arc<Services>,
}

impl Dispatcher {
    /// Dispatcher over `services`.
    #[must_use]
    pub fn new(services: Services) -> Self {
        Self {
            services: Arc::new(services),
        }
    }

    /// Shared handler dependencies.
    #[must_use]
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Handle one request message.
    ///
    /// Returns the correlated response, or `None` when the request is ignored,
    /// fails to decode, or belongs to an operation that sends nothing back.
    ///
    /// # Errors
    ///
    /// Returns an error when a collaborator fails outside the per-operation
    /// success contract.
    pub async fn dispatch(&self, message: &ValueSet) -> AppResult<Option<ValueSet>> {
        let metrics = &self.services.metrics;
        let envelope = match decode(message) {
            Ok(Decoded::Operation(envelope)) => envelope,
            Ok(Decoded::Ignored(reason)) => {
                trace!(?reason, "request ignored");
                metrics.inc_ignored();
                return Ok(None);
            }
            Err(err) => {
                warn!(field = err.field(), error = %err, "request rejected");
                metrics.inc_decode_failure();
                return Ok(None);
            }
        };

        let kind = envelope.operation.kind();
        metrics.inc_request(kind.as_str());
        let request_id = envelope.request_id;
        let span = request_span(kind.as_str(), request_id.as_deref());
        let response = handlers::handle(&self.services, envelope.operation)
            .instrument(span)
            .await?;

        Ok(response.map(|response| {
            if let Some(Value::Bool(succeeded)) = response.fields().get(SUCCESS_KEY) {
                metrics.record_outcome(kind.as_str(), Outcome::from_success(*succeeded));
            }
            response.into_message(request_id.as_deref())
        }))
    }
}
