//! # Request error taxonomy
//!
//! Every call through the [`crate::Gateway`] ends in either a payload or one
//! [`RequestError`]. The first four variants come from the response
//! classifier and are the same for JSON, multipart and download requests:
//!
//! | Variant | Raised when |
//! |---------|-------------|
//! | [`Transport`](RequestError::Transport) | No usable response: connection failure, or a 200 whose body is not a JSON envelope |
//! | [`Business`](RequestError::Business) | HTTP 200 with envelope `code != 0` |
//! | [`AuthExpired`](RequestError::AuthExpired) | HTTP 401; the session has already been cleared |
//! | [`Http`](RequestError::Http) | Any other status |
//!
//! The remaining variants are local failures that happen before or after the
//! exchange (unreadable upload file, storage failure, malformed base URL).

use std::path::PathBuf;

use store::StoreError;

/// Coarse classification of a [`RequestError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Business,
    AuthExpired,
    Http,
    Local,
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("network request failed: {0}")]
    Transport(String),
    #[error("{message}")]
    Business { code: i64, message: String },
    #[error("session expired, please log in again")]
    AuthExpired,
    #[error("request failed with HTTP status {status}")]
    Http {
        status: u16,
        message: Option<String>,
    },
    #[error("failed to read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("local storage failed: {0}")]
    Storage(#[from] StoreError),
    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl RequestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Business { .. } => ErrorKind::Business,
            Self::AuthExpired => ErrorKind::AuthExpired,
            Self::Http { .. } => ErrorKind::Http,
            Self::File { .. } | Self::Storage(_) | Self::InvalidUrl(_) => ErrorKind::Local,
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }

    /// Text suitable for a transient notice: the server's own message when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http {
                message: Some(message),
                ..
            } => message.clone(),
            other => other.to_string(),
        }
    }

    pub(crate) fn transport(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
