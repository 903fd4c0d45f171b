use nms_core::ValidationError;

/// Every way a client call can fail.
///
/// All four surface to the caller; the client never swallows or retries
/// any of them.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never reached the server, or no response came back
    /// (connection refused, DNS, timeout, broken body stream).
    #[error("network: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    RemoteRejection { status: u16, message: String },

    /// Success status, but the body is not the JSON we expected.
    #[error("decode: {0}")]
    MalformedResponse(String),

    /// Rejected locally, before any network call.
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
}

impl ApiError {
    /// Text suitable for showing to the user, if the error carries any.
    ///
    /// Transport and decode failures only have technical detail, so they
    /// return `None` and callers fall back to a generic message.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            ApiError::RemoteRejection { message, .. } if !message.trim().is_empty() => {
                Some(message.as_str())
            }
            ApiError::Validation(e) => Some(e.message.as_str()),
            _ => None,
        }
    }

    /// Short machine-readable label, used as a tracing field.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Transport(_) => "transport",
            ApiError::RemoteRejection { .. } => "rejected",
            ApiError::MalformedResponse(_) => "malformed",
            ApiError::Validation(_) => "validation",
        }
    }

    /// HTTP status for rejections.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RemoteRejection { status, .. } => Some(*status),
            _ => None,
        }
    }
}
