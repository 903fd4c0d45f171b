use nms_client::ApiError;
use nms_core::{ResourceKind, Verb};

/// The mutation a form performs; owns the user-facing wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormAction {
    pub resource: ResourceKind,
    pub verb: Verb,
}

impl FormAction {
    pub fn new(resource: ResourceKind, verb: Verb) -> Self {
        Self { resource, verb }
    }

    /// `"Deleting..."`
    pub fn progress_message(&self) -> String {
        format!("{}...", self.verb.progressive())
    }

    /// `"Device deleted successfully!"`
    pub fn success_message(&self) -> String {
        format!("{} {} successfully!", self.resource.label(), self.verb.past())
    }

    /// `"Failed to delete device."`
    pub fn failure_fallback(&self) -> String {
        format!("Failed to {} {}.", self.verb.infinitive(), self.resource.noun())
    }

    /// The error's own message if it has one, else the fallback.
    pub fn failure_message(&self, error: &ApiError) -> String {
        error
            .user_message()
            .map(str::to_string)
            .unwrap_or_else(|| self.failure_fallback())
    }
}
