//! Application and request spans.
//!
//! # Design
//! - The application span is entered for the whole process so every event carries build info.
//! - Request handling runs inside a span carrying the `fileop` and request identifier.

use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter the application-level tracing span for the lifetime of the guard.
    #[must_use]
    pub fn new(mode: impl Into<String>) -> Self {
        let mode = mode.into();
        let span: &'static Span = Box::leak(Box::new(
            tracing::info_span!("app", mode = %mode, build_sha = %build_sha()),
        ));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

/// Span wrapping the handling of one request.
#[must_use]
pub fn request_span(fileop: &str, request_id: Option<&str>) -> Span {
    tracing::info_span!(
        "request",
        fileop = %fileop,
        request_id = %request_id.unwrap_or("-"),
    )
}
