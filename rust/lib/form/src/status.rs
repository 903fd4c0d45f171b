use serde::{Deserialize, Serialize};

/// Lifecycle phase of a mutation form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormPhase {
    #[default]
    Idle,
    /// Request in flight. Rendered as an informational banner.
    #[serde(rename = "info")]
    Submitting,
    Success,
    Error,
}

impl FormPhase {
    /// Whether a new submit may start from this phase.
    pub fn accepts_submit(self) -> bool {
        matches!(self, FormPhase::Idle | FormPhase::Error)
    }

    /// Banner kind, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            FormPhase::Idle => "idle",
            FormPhase::Submitting => "info",
            FormPhase::Success => "success",
            FormPhase::Error => "error",
        }
    }
}

/// What the status banner shows: `{phase, message}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormStatus {
    pub phase: FormPhase,
    pub message: String,
}

impl FormStatus {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn submitting(message: impl Into<String>) -> Self {
        Self {
            phase: FormPhase::Submitting,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            phase: FormPhase::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            phase: FormPhase::Error,
            message: message.into(),
        }
    }
}
