use thiserror::Error;

/// What went wrong talking to the poll server.
#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum ApiError {
    /// The request never produced a response: connect, send or timeout.
    #[error("request failed: {0}")]
    Transport(String),
    /// The server answered with a non-success status. `message` carries the
    /// server's own error text when the body had one; validation rejections
    /// arrive this way and are shown to the user verbatim.
    #[error("server returned status {status}")]
    Status {
        status: u16,
        message: Option<String>,
    },
    /// A success response that could not be decoded.
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether a later, identical request may succeed. Transport and decode
    /// failures and server errors are worth retrying on the next cycle;
    /// client errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) | ApiError::Decode(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
        }
    }

    /// The server-provided error text, if the response carried one.
    pub fn server_message(&self) -> Option<String> {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } => Some(message.clone()),
            _ => None,
        }
    }
}
