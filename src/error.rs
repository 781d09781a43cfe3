//! Error types for request validation and backend calls.

use thiserror::Error;

/// The inbound request is unusable; no backend is contacted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Missing company")]
    MissingCompany,

    #[error("Missing industry")]
    MissingIndustry,
}

/// A single backend call failed.
///
/// The `Display` text is recorded verbatim as the backend's failure reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("missing credential")]
    MissingCredential,

    #[error("http status {0}")]
    HttpStatus(u16),

    #[error("malformed response")]
    MalformedResponse,

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("timeout")]
    Timeout,
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Transport(e.to_string())
        }
    }
}
