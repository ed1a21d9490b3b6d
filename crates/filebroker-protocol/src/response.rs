//! Response construction and correlation.

use crate::value::{Value, ValueSet};
use crate::{REQUEST_ID_KEY, SUCCESS_KEY};

/// Result fields produced by a handler, before correlation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    fields: ValueSet,
}

impl Response {
    /// Empty response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Response carrying only the `Success` flag.
    #[must_use]
    pub fn success(succeeded: bool) -> Self {
        Self::new().with(SUCCESS_KEY, succeeded)
    }

    /// Add a field.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key, value);
        self
    }

    /// Borrow the result fields.
    #[must_use]
    pub const fn fields(&self) -> &ValueSet {
        &self.fields
    }

    /// Produce the wire message, echoing the correlation token when the request had one.
    #[must_use]
    pub fn into_message(self, request_id: Option<&str>) -> ValueSet {
        let mut message = self.fields;
        if let Some(request_id) = request_id {
            message.insert(REQUEST_ID_KEY, request_id);
        }
        message
    }
}
