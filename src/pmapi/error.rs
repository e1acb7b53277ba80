// Errors returned by the pmwebapi client

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PmApiError {
    /// Non-success status from pmproxy.
    #[error("pmapi returned status {status} for {path}")]
    Http { status: u16, path: String },

    #[error("pmapi request failed: {0}")]
    Request(String),

    #[error("failed to parse pmapi response: {0}")]
    Parse(String),

    #[error("pmapi connection failed: {0}")]
    Connection(String),

    #[error("pmapi request timed out")]
    Timeout,
}

impl PmApiError {
    /// A 4xx from a context-scoped URL means pmproxy no longer knows the
    /// context (expired or never existed); the caller must create a new one.
    pub fn is_context_lost(&self) -> bool {
        matches!(self, PmApiError::Http { status, .. } if (400..500).contains(status))
    }
}

impl From<reqwest::Error> for PmApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PmApiError::Timeout
        } else if err.is_connect() {
            PmApiError::Connection(err.to_string())
        } else if err.is_decode() {
            PmApiError::Parse(err.to_string())
        } else {
            PmApiError::Request(err.to_string())
        }
    }
}
