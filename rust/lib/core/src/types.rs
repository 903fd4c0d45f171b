use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validate;
use crate::ValidationError;

/// Field name → new value, serialized as a JSON object.
pub type Fields = serde_json::Map<String, Value>;

/// Resources the dashboard can mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Device,
    DeviceType,
    Location,
    LocationType,
}

impl ResourceKind {
    /// Sentence-case label, e.g. `"Device type"`.
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Device => "Device",
            ResourceKind::DeviceType => "Device type",
            ResourceKind::Location => "Location",
            ResourceKind::LocationType => "Location type",
        }
    }

    /// Lower-case noun, e.g. `"device type"`.
    pub fn noun(self) -> &'static str {
        match self {
            ResourceKind::Device => "device",
            ResourceKind::DeviceType => "device type",
            ResourceKind::Location => "location",
            ResourceKind::LocationType => "location type",
        }
    }

    /// Type resources only support creation.
    fn supports(self, verb: Verb) -> bool {
        match self {
            ResourceKind::Device | ResourceKind::Location => true,
            ResourceKind::DeviceType | ResourceKind::LocationType => verb == Verb::Create,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    Create,
    Edit,
    Delete,
}

impl Verb {
    /// `"create"`, `"edit"`, `"delete"`.
    pub fn infinitive(self) -> &'static str {
        match self {
            Verb::Create => "create",
            Verb::Edit => "edit",
            Verb::Delete => "delete",
        }
    }

    /// `"created"`, `"edited"`, `"deleted"`.
    pub fn past(self) -> &'static str {
        match self {
            Verb::Create => "created",
            Verb::Edit => "edited",
            Verb::Delete => "deleted",
        }
    }

    /// `"Creating"`, `"Editing"`, `"Deleting"`.
    pub fn progressive(self) -> &'static str {
        match self {
            Verb::Create => "Creating",
            Verb::Edit => "Editing",
            Verb::Delete => "Deleting",
        }
    }

    /// Whether the verb addresses an existing record by id.
    pub fn targets_record(self) -> bool {
        !matches!(self, Verb::Create)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.infinitive())
    }
}

/// One create/edit/delete call against the upstream API.
///
/// Built per call and discarded once the call resolves. Construct through
/// [`MutationRequest::create`], [`MutationRequest::edit`] or
/// [`MutationRequest::delete`]; [`MutationRequest::validate`] runs before
/// anything touches the network.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
    pub resource: ResourceKind,
    pub verb: Verb,
    pub id: Option<u64>,
    pub fields: Fields,
}

impl MutationRequest {
    pub fn create(resource: ResourceKind, fields: Fields) -> Self {
        Self {
            resource,
            verb: Verb::Create,
            id: None,
            fields,
        }
    }

    pub fn edit(resource: ResourceKind, id: u64, fields: Fields) -> Self {
        Self {
            resource,
            verb: Verb::Edit,
            id: Some(id),
            fields,
        }
    }

    pub fn delete(resource: ResourceKind, id: u64) -> Self {
        Self {
            resource,
            verb: Verb::Delete,
            id: Some(id),
            fields: Fields::new(),
        }
    }

    /// Shorthand for the `{ name }` payload used by the type resources.
    pub fn create_named(resource: ResourceKind, name: &str) -> Self {
        let mut fields = Fields::new();
        fields.insert("name".into(), Value::String(name.trim().to_string()));
        Self::create(resource, fields)
    }

    /// Reject malformed requests: unsupported (resource, verb) pairs,
    /// missing or zero identifiers, empty field sets.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.resource.supports(self.verb) {
            return Err(ValidationError::new(
                "verb",
                format!("cannot {} a {}", self.verb, self.resource),
            ));
        }

        match (self.verb.targets_record(), self.id) {
            (true, Some(id)) => {
                validate::positive_id("id", id)?;
            }
            (true, None) => {
                return Err(ValidationError::new("id", "id is required"));
            }
            (false, Some(_)) => {
                return Err(ValidationError::new("id", "create must not carry an id"));
            }
            (false, None) => {}
        }

        match self.verb {
            Verb::Create => {
                if self.fields.is_empty() {
                    return Err(ValidationError::new("fields", "no fields to create"));
                }
                if matches!(
                    self.resource,
                    ResourceKind::DeviceType | ResourceKind::LocationType
                ) {
                    let name = self.fields.get("name").and_then(Value::as_str).unwrap_or("");
                    validate::required("name", "Name", name)?;
                }
            }
            Verb::Edit => {
                if self.fields.is_empty() {
                    return Err(ValidationError::new("fields", "no fields to edit"));
                }
                if self.resource == ResourceKind::Location && self.fields.len() != 1 {
                    return Err(ValidationError::new(
                        "fields",
                        "a location edit changes exactly one field",
                    ));
                }
                for key in self.fields.keys() {
                    validate::required("field", "Field", key)?;
                    validate::max_chars("field", "Field", key, 50)?;
                }
            }
            Verb::Delete => {}
        }

        Ok(())
    }
}
