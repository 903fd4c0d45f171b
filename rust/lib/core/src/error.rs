use thiserror::Error;

/// Input rejected before any request is built.
///
/// `Display` is just the message, so it can be shown to the user as-is;
/// `field` names the offending input for logs and callers that want to
/// highlight it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
