//! Shared error type across bubblechat crates.

use thiserror::Error;

use crate::color::ColorIdentity;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input (room code, empty message, malformed frame).
    BadRequest,
    /// Room already exists.
    AlreadyExists,
    /// Room does not exist.
    NotFound,
    /// Color held by another session in the room.
    ColorTaken,
    /// Request would not change anything.
    NoOp,
    /// Store I/O failed (network, permission, timeout).
    Transient,
    /// Unsupported protocol or config version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::AlreadyExists => "ALREADY_EXISTS",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::ColorTaken => "COLOR_TAKEN",
            ClientCode::NoOp => "NO_OP",
            ClientCode::Transient => "TRANSIENT",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Unified error type used by core, store and gateway.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("room already exists: {0}")]
    AlreadyExists(String),
    #[error("room not found: {0}")]
    NotFound(String),
    #[error("color taken: {0}")]
    ColorTaken(ColorIdentity),
    #[error("no change")]
    NoOp,
    #[error("store unavailable: {0}")]
    TransientFailure(String),
    #[error("unsupported protocol version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl ChatError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            ChatError::BadRequest(_) => ClientCode::BadRequest,
            ChatError::AlreadyExists(_) => ClientCode::AlreadyExists,
            ChatError::NotFound(_) => ClientCode::NotFound,
            ChatError::ColorTaken(_) => ClientCode::ColorTaken,
            ChatError::NoOp => ClientCode::NoOp,
            ChatError::TransientFailure(_) => ClientCode::Transient,
            ChatError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            ChatError::Internal(_) => ClientCode::Internal,
        }
    }

    /// True for failures the caller may retry later.
    pub fn is_transient(&self) -> bool {
        matches!(self, ChatError::TransientFailure(_))
    }
}
