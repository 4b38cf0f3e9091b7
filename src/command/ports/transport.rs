//! Ports facing the outer transport layer.

use async_trait::async_trait;
use http::StatusCode;
use serde_json::Value;

use crate::command::domain::{CommandRequest, CommandResponse};

/// Receives the single response produced for a request.
///
/// Wire serialisation is the transport's responsibility.
pub trait ResponseSink: Send {
    /// Emits a success response.
    fn success(&mut self, status: StatusCode, data: Value, message: Option<String>);

    /// Emits an error response.
    fn error(&mut self, status: StatusCode, message: String);

    /// Forwards a [`CommandResponse`] to the matching emitter.
    fn send(&mut self, response: CommandResponse) {
        match response {
            CommandResponse::Success {
                status,
                data,
                message,
            } => self.success(status, data, message),
            CommandResponse::Error { status, message } => self.error(status, message),
        }
    }
}

/// A routable request handler.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handles a request, always producing exactly one response.
    async fn handle(&self, request: &CommandRequest) -> CommandResponse;
}
