use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use nms_core::{
    ClientSettings, Fields, LocationCreateRoute, MutationRequest, NewDevice, NewLocation,
    ResourceKind, TypeOption, ValidationError, Verb, Worker,
};

use crate::request::RequestSpec;
use crate::token::TokenSource;
use crate::ApiError;

/// Message carried by a rejection: the response body text, else the
/// status's canonical reason, else empty.
pub(crate) fn rejection_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    status.canonical_reason().unwrap_or_default().to_string()
}

/// Resolved target of a mutation.
#[derive(Debug, Clone, PartialEq)]
struct Route {
    method: Method,
    path: String,
    body: Option<Value>,
}

/// Authenticated client for the device/location REST API.
///
/// One operation per (resource, verb) pair, plus the read endpoints the
/// forms use to fill their pickers. Every call asks the token source for
/// a fresh credential, validates input before touching the network, and
/// returns the upstream JSON untouched.
pub struct NmsClient {
    http: reqwest::Client,
    base_url: String,
    token_source: Arc<dyn TokenSource>,
    location_create: LocationCreateRoute,
}

impl NmsClient {
    pub fn new(settings: &ClientSettings, token_source: Arc<dyn TokenSource>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: settings.api_source.trim_end_matches('/').to_string(),
            token_source,
            location_create: settings.location_create_route,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Validate, route and send a mutation.
    pub async fn execute(&self, request: &MutationRequest) -> Result<Value, ApiError> {
        request.validate()?;
        let route = self.route(request)?;
        self.send(route.method, &route.path, route.body.as_ref()).await
    }

    // ── Devices ─────────────────────────────────────────────────────

    pub async fn create_device(&self, device: &NewDevice) -> Result<Value, ApiError> {
        let fields = device.to_fields()?;
        self.execute(&MutationRequest::create(ResourceKind::Device, fields)).await
    }

    pub async fn create_device_type(&self, name: &str) -> Result<Value, ApiError> {
        self.execute(&MutationRequest::create_named(ResourceKind::DeviceType, name)).await
    }

    /// `PUT /devices/{id}` with `{ field: value }`.
    pub async fn edit_device(&self, id: u64, field: &str, value: impl Into<Value>) -> Result<Value, ApiError> {
        let mut fields = Fields::new();
        fields.insert(field.to_string(), value.into());
        self.execute(&MutationRequest::edit(ResourceKind::Device, id, fields)).await
    }

    pub async fn delete_device(&self, id: u64) -> Result<Value, ApiError> {
        self.execute(&MutationRequest::delete(ResourceKind::Device, id)).await
    }

    // ── Locations ───────────────────────────────────────────────────

    pub async fn create_location(&self, location: &NewLocation) -> Result<Value, ApiError> {
        let fields = location.to_fields()?;
        self.execute(&MutationRequest::create(ResourceKind::Location, fields)).await
    }

    pub async fn create_location_type(&self, name: &str) -> Result<Value, ApiError> {
        self.execute(&MutationRequest::create_named(ResourceKind::LocationType, name)).await
    }

    /// `PUT /locations/{id}` with `{ field, data }`.
    pub async fn edit_location(&self, id: u64, field: &str, data: impl Into<Value>) -> Result<Value, ApiError> {
        let mut fields = Fields::new();
        fields.insert(field.to_string(), data.into());
        self.execute(&MutationRequest::edit(ResourceKind::Location, id, fields)).await
    }

    pub async fn delete_location(&self, id: u64) -> Result<Value, ApiError> {
        self.execute(&MutationRequest::delete(ResourceKind::Location, id)).await
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// `GET /devices/{id}`, passed through verbatim.
    pub async fn device(&self, id: u64) -> Result<Value, ApiError> {
        nms_core::validate::positive_id("id", id)?;
        self.send(Method::GET, &format!("/devices/{}", id), None).await
    }

    /// `GET /devices/statistics`, passed through verbatim.
    pub async fn device_statistics(&self) -> Result<Value, ApiError> {
        self.send(Method::GET, "/devices/statistics", None).await
    }

    /// Device types offered by the create-device form.
    pub async fn device_types(&self) -> Result<Vec<TypeOption>, ApiError> {
        #[derive(Deserialize)]
        struct Envelope {
            device_types: Vec<TypeOption>,
        }
        let envelope: Envelope = self.get_as("/devices/types").await?;
        Ok(envelope.device_types)
    }

    /// Location types offered by the create-location form.
    pub async fn location_types(&self) -> Result<Vec<TypeOption>, ApiError> {
        self.get_as("/locations/types").await
    }

    /// Probe workers a device can be assigned to.
    pub async fn workers(&self) -> Result<Vec<Worker>, ApiError> {
        #[derive(Deserialize)]
        struct Envelope {
            workers: Vec<Worker>,
        }
        let envelope: Envelope = self.get_as("/workers").await?;
        Ok(envelope.workers)
    }

    // ── Plumbing ────────────────────────────────────────────────────

    fn route(&self, request: &MutationRequest) -> Result<Route, ApiError> {
        let id = || {
            request
                .id
                .ok_or_else(|| ValidationError::new("id", "id is required"))
        };
        let body = || Some(Value::Object(request.fields.clone()));

        let route = match (request.resource, request.verb) {
            (ResourceKind::Device, Verb::Create) => Route {
                method: Method::POST,
                path: "/devices".into(),
                body: body(),
            },
            (ResourceKind::DeviceType, Verb::Create) => Route {
                method: Method::POST,
                path: "/devices/types".into(),
                body: Some(name_payload(&request.fields)),
            },
            (ResourceKind::Device, Verb::Edit) => Route {
                method: Method::PUT,
                path: format!("/devices/{}", id()?),
                body: body(),
            },
            (ResourceKind::Device, Verb::Delete) => Route {
                method: Method::DELETE,
                path: format!("/devices/{}", id()?),
                body: None,
            },
            (ResourceKind::Location, Verb::Create) => {
                if self.location_create == LocationCreateRoute::Devices {
                    warn!(
                        "creating a location via /devices; set NMS_LOCATION_CREATE_ROUTE=locations once upstream confirms the route"
                    );
                }
                Route {
                    method: Method::POST,
                    path: self.location_create.path().into(),
                    body: body(),
                }
            }
            (ResourceKind::LocationType, Verb::Create) => Route {
                method: Method::POST,
                path: "/locations/types".into(),
                body: Some(name_payload(&request.fields)),
            },
            (ResourceKind::Location, Verb::Edit) => {
                let (field, data) = request
                    .fields
                    .iter()
                    .next()
                    .ok_or_else(|| ValidationError::new("fields", "no fields to edit"))?;
                Route {
                    method: Method::PUT,
                    path: format!("/locations/{}", id()?),
                    body: Some(serde_json::json!({ "field": field, "data": data })),
                }
            }
            (ResourceKind::Location, Verb::Delete) => Route {
                method: Method::DELETE,
                path: format!("/locations/{}", id()?),
                body: None,
            },
            (resource, verb) => {
                return Err(ValidationError::new("verb", format!("cannot {} a {}", verb, resource)).into());
            }
        };
        Ok(route)
    }

    async fn get_as<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let value = self.send(Method::GET, path, None).await?;
        serde_json::from_value(value)
            .map_err(|e| ApiError::MalformedResponse(format!("{}: {}", path, e)))
    }

    /// Build with a fresh token, send, and classify the response.
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        let token = self.token_source.token().await?;
        let spec = RequestSpec::build(method, format!("{}{}", self.base_url, path), body, token.as_deref())?;
        debug!(method = %spec.method, url = %spec.url, authorized = spec.is_authorized(), "sending request");

        let resp = spec.into_request(&self.http).send().await.map_err(|e| {
            warn!(path, error = %e, "request failed before a response arrived");
            ApiError::Transport(e)
        })?;
        Self::parse(path, resp).await
    }

    /// Map a response to the upstream JSON or a classified error.
    /// An empty success body (e.g. 204) becomes `null`.
    async fn parse(path: &str, resp: reqwest::Response) -> Result<Value, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = rejection_message(status, &body);
            warn!(path, status = status.as_u16(), %message, "request rejected");
            return Err(ApiError::RemoteRejection {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = resp.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::MalformedResponse(format!("response body: {}", e)))
    }
}

/// `{ name }` body for the type resources.
fn name_payload(fields: &Fields) -> Value {
    let name = fields.get("name").cloned().unwrap_or(Value::Null);
    serde_json::json!({ "name": name })
}
