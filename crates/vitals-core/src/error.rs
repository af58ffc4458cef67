//! Shared error type across vitals crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed config or request.
    BadRequest,
    /// Unsupported config version.
    UnsupportedVersion,
    /// A dependency did not answer (probe failure or timeout).
    Unavailable,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Unavailable => "UNAVAILABLE",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, VitalsError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum VitalsError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("{0}")]
    ProbeFailed(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl VitalsError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            VitalsError::BadRequest(_) => ClientCode::BadRequest,
            VitalsError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            VitalsError::ProbeFailed(_) | VitalsError::Timeout(_) => ClientCode::Unavailable,
            VitalsError::Internal(_) => ClientCode::Internal,
        }
    }
}

impl From<std::io::Error> for VitalsError {
    fn from(e: std::io::Error) -> Self {
        VitalsError::ProbeFailed(e.to_string())
    }
}
