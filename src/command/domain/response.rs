//! Transport-agnostic response produced by the command pipeline.

use http::StatusCode;
use serde_json::Value;

use crate::outcome::Failure;

/// The single response emitted for a request.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResponse {
    /// The command succeeded.
    Success {
        /// Status code for the transport.
        status: StatusCode,
        /// Response payload.
        data: Value,
        /// Optional human-readable message.
        message: Option<String>,
    },
    /// The command failed.
    Error {
        /// Status code for the transport.
        status: StatusCode,
        /// Human-readable failure message.
        message: String,
    },
}

impl CommandResponse {
    /// Creates a success response without a message.
    #[must_use]
    pub const fn success(status: StatusCode, data: Value) -> Self {
        Self::Success {
            status,
            data,
            message: None,
        }
    }

    /// Creates an error response.
    #[must_use]
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Error {
            status,
            message: message.into(),
        }
    }

    /// Creates a 500 response mentioning the logging context.
    #[must_use]
    pub fn internal_error(context: &str) -> Self {
        Self::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("internal error in {context}"),
        )
    }

    /// Status code of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Success { status, .. } | Self::Error { status, .. } => *status,
        }
    }

    /// Returns `true` for success responses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Success payload, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&Value> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Error { .. } => None,
        }
    }

    /// Success or error message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { message, .. } => message.as_deref(),
            Self::Error { message, .. } => Some(message),
        }
    }
}

impl From<Failure> for CommandResponse {
    fn from(failure: Failure) -> Self {
        let status = failure.status();
        Self::error(status, failure.into_message())
    }
}
