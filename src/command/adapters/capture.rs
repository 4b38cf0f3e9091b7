//! In-memory [`ResponseSink`] that records what the pipeline emitted.

use http::StatusCode;
use serde_json::Value;

use crate::command::domain::CommandResponse;
use crate::command::ports::ResponseSink;

/// Sink keeping every emitted response in order.
///
/// Useful for tests and for transports that serialise after dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedResponse {
    responses: Vec<CommandResponse>,
}

impl CapturedResponse {
    /// Creates an empty sink.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            responses: Vec::new(),
        }
    }

    /// Every response emitted so far.
    #[must_use]
    pub fn responses(&self) -> &[CommandResponse] {
        &self.responses
    }

    /// The most recent response.
    #[must_use]
    pub fn last(&self) -> Option<&CommandResponse> {
        self.responses.last()
    }

    /// Removes and returns the recorded responses.
    pub fn take(&mut self) -> Vec<CommandResponse> {
        std::mem::take(&mut self.responses)
    }
}

impl ResponseSink for CapturedResponse {
    fn success(&mut self, status: StatusCode, data: Value, message: Option<String>) {
        self.responses.push(CommandResponse::Success {
            status,
            data,
            message,
        });
    }

    fn error(&mut self, status: StatusCode, message: String) {
        self.responses.push(CommandResponse::error(status, message));
    }
}
