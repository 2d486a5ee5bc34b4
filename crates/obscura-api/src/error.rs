use thiserror::Error;

/// Errors returned by the backend client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid base url: {0}")]
    InvalidUrl(String),

    /// Non-2xx response. `message` is the server's `error` field when it
    /// sent one.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    /// HTTP status of a rejected request, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            ApiError::InvalidUrl(_) => None,
        }
    }
}
