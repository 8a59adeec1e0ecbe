use std::time::Duration;
use strum_macros::Display;

/// Errors surfaced by the news client.
///
/// `Clone` so one failed network call can be handed to every caller that
/// joined it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("HTTP error! status: {status} ({url})")]
    Status { status: u16, url: String },
    #[error("Invalid request URL {0}")]
    InvalidUrl(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Malformed response body: {0}")]
    Serialization(String),
    #[error("In-flight request was dropped before it settled")]
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    Serialization,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Status { .. }
            | Error::InvalidUrl(_)
            | Error::Network(_)
            | Error::Timeout(_) => ErrorKind::Transport,
            Error::Serialization(_) => ErrorKind::Serialization,
            Error::Abandoned => ErrorKind::Internal,
        }
    }

    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<surf::Error> for Error {
    fn from(e: surf::Error) -> Self {
        Error::Network(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
