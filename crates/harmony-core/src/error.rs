//! Error types for the Harmony matchmaking engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid profile data: {0}")]
    Data(String),

    #[error("Non-numeric value for dimension '{key}'")]
    NonNumeric { key: String },

    #[error("Unknown match: {0}")]
    UnknownMatch(String),

    #[error("Compatibility computation failed: {0}")]
    Compute(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Session not initialized")]
    NotInitialized,

    #[error("Session already ended")]
    SessionEnded,

    #[error("Candidate store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
}

/// Coarse error category reported to callers alongside a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    DataError,
    ComputeError,
    ExternalServiceError,
    StateError,
    ConfigError,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Data(_)
            | Error::NonNumeric { .. }
            | Error::UnknownMatch(_)
            | Error::Store(_)
            | Error::Serialization(_) => ErrorKind::DataError,
            Error::Compute(_) => ErrorKind::ComputeError,
            Error::ExternalService(_) | Error::Timeout { .. } => ErrorKind::ExternalServiceError,
            Error::NotInitialized | Error::SessionEnded => ErrorKind::StateError,
            Error::Config(_) => ErrorKind::ConfigError,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::UnknownMatch("x".into()).kind(), ErrorKind::DataError);
        assert_eq!(Error::NotInitialized.kind(), ErrorKind::StateError);
        assert_eq!(Error::Timeout { duration_ms: 5 }.kind(), ErrorKind::ExternalServiceError);
        assert_eq!(Error::Compute("nan".into()).kind(), ErrorKind::ComputeError);
    }
}
