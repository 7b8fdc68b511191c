//! Shared error type across secsgate crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input, missing fields, or unresolved placeholders.
    BadRequest,
    /// Unknown template or connection.
    NotFound,
    /// The connection rejected the message; nothing was sent.
    Transport,
    /// Sent, but no reply arrived in time.
    Timeout,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::Transport => "TRANSPORT",
            ClientCode::Timeout => "TIMEOUT",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, SecsGateError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum SecsGateError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("missing values for placeholders: {}", .0.join(", "))]
    MissingPlaceholders(Vec<String>),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("no reply for token {token} within {timeout_ms}ms")]
    Timeout { token: u32, timeout_ms: u64 },
    #[error("internal: {0}")]
    Internal(String),
}

impl SecsGateError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            SecsGateError::BadRequest(_) => ClientCode::BadRequest,
            SecsGateError::MissingPlaceholders(_) => ClientCode::BadRequest,
            SecsGateError::NotFound(_) => ClientCode::NotFound,
            SecsGateError::Transport(_) => ClientCode::Transport,
            SecsGateError::Timeout { .. } => ClientCode::Timeout,
            SecsGateError::Internal(_) => ClientCode::Internal,
        }
    }
}
