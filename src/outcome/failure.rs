//! Failure payload and the error taxonomy derived from its status code.

use http::StatusCode;
use thiserror::Error;

/// Error category derived from a failure's status code.
///
/// Any client error outside the named categories is reported as
/// [`ErrorKind::Validation`]; every server error is [`ErrorKind::Internal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing input in any request channel (400).
    Validation,
    /// No authenticated identity was supplied (401).
    Authentication,
    /// The identity lacks a required role (403).
    Authorization,
    /// An identifier or filter matched nothing (404).
    NotFound,
    /// A uniqueness constraint was violated (409).
    Conflict,
    /// An unexpected error occurred while processing the request (500).
    Internal,
}

impl ErrorKind {
    /// Classifies a status code.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Authentication,
            StatusCode::FORBIDDEN => Self::Authorization,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::CONFLICT => Self::Conflict,
            other if other.is_server_error() => Self::Internal,
            _ => Self::Validation,
        }
    }

    /// Returns the canonical status code for the category.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The failing branch of an [`Outcome`](super::Outcome).
///
/// # Examples
///
/// ```
/// use conservatory::outcome::{ErrorKind, Failure};
/// use http::StatusCode;
///
/// let failure = Failure::not_found("material not found");
/// assert_eq!(failure.status(), StatusCode::NOT_FOUND);
/// assert_eq!(failure.kind(), ErrorKind::NotFound);
/// assert_eq!(failure.to_string(), "material not found");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Failure {
    status: StatusCode,
    message: String,
}

impl Failure {
    /// Creates a failure with an explicit status code.
    #[must_use]
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a failure for the given error category.
    #[must_use]
    pub fn of_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(message, kind.status())
    }

    /// Convenience constructor for [`ErrorKind::Validation`].
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Validation, message)
    }

    /// Convenience constructor for [`ErrorKind::Authentication`].
    #[must_use]
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Authentication, message)
    }

    /// Convenience constructor for [`ErrorKind::Authorization`].
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Authorization, message)
    }

    /// Convenience constructor for [`ErrorKind::NotFound`].
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::NotFound, message)
    }

    /// Convenience constructor for [`ErrorKind::Conflict`].
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Conflict, message)
    }

    /// Convenience constructor for [`ErrorKind::Internal`].
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::of_kind(ErrorKind::Internal, message)
    }

    /// Status code reported to the transport.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Human-readable message reported to the transport.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Error category derived from the status code.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::from_status(self.status)
    }

    /// Consumes the failure, returning its message.
    #[must_use]
    pub fn into_message(self) -> String {
        self.message
    }

    /// Prefixes the message with `context`, keeping the status code.
    #[must_use]
    pub fn with_context(self, context: impl std::fmt::Display) -> Self {
        Self {
            status: self.status,
            message: format!("{context}: {}", self.message),
        }
    }
}
