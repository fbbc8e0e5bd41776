//! Exception controller.
//!
//! Turns a captured failure into page content. Whether diagnostic detail is
//! shown is decided by the caller when the controller is built.

use crate::failure::FailureEnvelope;
use crate::view::ExceptionView;

/// Renders error pages. Implementations must not panic or perform I/O.
pub trait ErrorRenderer: Send + Sync {
    fn not_found(&self, failure: &FailureEnvelope) -> String;
    fn internal_error(&self, failure: &FailureEnvelope) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExceptionController {
    show_detail: bool,
}

impl ExceptionController {
    pub fn new(show_detail: bool) -> Self {
        Self { show_detail }
    }

    pub fn shows_detail(&self) -> bool {
        self.show_detail
    }

    pub fn error404_action(&self, message: &str) -> String {
        ExceptionView::render404(message, self.show_detail)
    }

    pub fn error500_action(&self, failure: &FailureEnvelope) -> String {
        ExceptionView::render500(failure, self.show_detail)
    }
}

impl ErrorRenderer for ExceptionController {
    fn not_found(&self, failure: &FailureEnvelope) -> String {
        self.error404_action(&failure.message)
    }

    fn internal_error(&self, failure: &FailureEnvelope) -> String {
        self.error500_action(failure)
    }
}
