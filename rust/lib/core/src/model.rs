//! Typed create payloads and the lookup records the forms offer as choices.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Fields;
use crate::validate;
use crate::ValidationError;

/// Monitoring protocol of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Icmp,
    Snmp,
    Gprs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnmpVersion {
    #[serde(rename = "1")]
    V1,
    #[serde(rename = "2c")]
    V2c,
    #[serde(rename = "3")]
    V3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SnmpAuthProtocol {
    Md5,
    Sha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SnmpPrivProtocol {
    Des,
    Aes,
}

const SNMP_KEYS: [&str; 7] = [
    "snmp_community",
    "snmp_version",
    "snmp_auth_protocol",
    "snmp_username",
    "snmp_password",
    "snmp_priv_protocol",
    "snmp_priv_password",
];

const GPRS_KEYS: [&str; 2] = ["imei", "port"];

/// Payload for `POST /devices`.
///
/// Protocol-specific settings are optional on the struct; only the ones
/// matching `protocol` are sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDevice {
    pub protocol: Protocol,
    pub ip: String,
    pub device_type_id: u64,
    pub display: String,
    pub hostname: String,
    pub worker_id: String,
    #[serde(default = "default_location_id")]
    pub location_id: u64,
    /// Probe timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u32,
    /// Seconds between checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_interval: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_community: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_version: Option<SnmpVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_auth_protocol: Option<SnmpAuthProtocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_priv_protocol: Option<SnmpPrivProtocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_priv_password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imei: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

fn default_location_id() -> u64 {
    1
}

fn default_timeout() -> u32 {
    30
}

impl NewDevice {
    /// A device with the required fields set and everything else defaulted.
    pub fn new(
        protocol: Protocol,
        ip: impl Into<String>,
        device_type_id: u64,
        display: impl Into<String>,
        hostname: impl Into<String>,
        worker_id: impl Into<String>,
    ) -> Self {
        Self {
            protocol,
            ip: ip.into(),
            device_type_id,
            display: display.into(),
            hostname: hostname.into(),
            worker_id: worker_id.into(),
            location_id: default_location_id(),
            timeout: default_timeout(),
            check_interval: None,
            snmp_community: None,
            snmp_version: None,
            snmp_auth_protocol: None,
            snmp_username: None,
            snmp_password: None,
            snmp_priv_protocol: None,
            snmp_priv_password: None,
            imei: None,
            port: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::required("display", "Display name", &self.display)?;
        validate::required("hostname", "Hostname", &self.hostname)?;
        validate::required("worker_id", "Worker ID", &self.worker_id)?;
        validate::ipv4("ip", &self.ip)?;
        validate::positive_id("device_type_id", self.device_type_id)?;
        validate::positive_id("location_id", self.location_id)?;

        if !(1..=30).contains(&self.timeout) {
            return Err(ValidationError::new(
                "timeout",
                "Timeout must be between 1 and 30 seconds",
            ));
        }
        if let Some(interval) = self.check_interval {
            if !(30..=3600).contains(&interval) {
                return Err(ValidationError::new(
                    "check_interval",
                    "Check interval must be between 30 and 3600 seconds",
                ));
            }
        }
        if self.protocol == Protocol::Gprs && self.port == Some(0) {
            return Err(ValidationError::new("port", "Port must be at least 1"));
        }
        Ok(())
    }

    /// Validate and flatten into the JSON field set sent upstream.
    pub fn to_fields(&self) -> Result<Fields, ValidationError> {
        self.validate()?;

        let mut fields = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => return Err(ValidationError::new("device", "device is not serializable")),
        };
        if self.protocol != Protocol::Snmp {
            for key in SNMP_KEYS {
                fields.remove(key);
            }
        }
        if self.protocol != Protocol::Gprs {
            for key in GPRS_KEYS {
                fields.remove(key);
            }
        }
        Ok(fields)
    }
}

/// Payload for location creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLocation {
    pub name: String,
    pub location_type_id: u64,
    #[serde(default)]
    pub area: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub project: String,
    #[serde(default = "default_status")]
    pub status: bool,
    #[serde(default)]
    pub status_reason: String,
    #[serde(default)]
    pub worker_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_location: Option<String>,
}

fn default_status() -> bool {
    true
}

impl NewLocation {
    pub fn new(name: impl Into<String>, location_type_id: u64, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            location_type_id,
            area: String::new(),
            lat,
            lng,
            project: String::new(),
            status: default_status(),
            status_reason: String::new(),
            worker_id: String::new(),
            parent_location: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::required("name", "Location", &self.name)?;
        validate::max_chars("name", "Location", &self.name, 100)?;
        validate::max_chars("area", "Area", &self.area, 50)?;
        validate::max_chars("project", "Project", &self.project, 50)?;
        validate::in_range("lat", "Latitude", self.lat, -90.0..=90.0)?;
        validate::in_range("lng", "Longitude", self.lng, -180.0..=180.0)?;
        validate::positive_id("location_type_id", self.location_type_id)?;
        Ok(())
    }

    pub fn to_fields(&self) -> Result<Fields, ValidationError> {
        self.validate()?;
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(ValidationError::new("location", "location is not serializable")),
        }
    }
}

/// `{id, name}` option offered by the device-type and location-type pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeOption {
    pub id: u64,
    pub name: String,
}

/// Probe worker a device can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    pub hostname: String,
}
