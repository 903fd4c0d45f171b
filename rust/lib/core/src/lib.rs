//! Shared value types for the NMS dashboard client.
//!
//! Nothing in here performs I/O. The HTTP side lives in `nms-client`,
//! the form lifecycle in `nms-form`.

pub mod config;
pub mod error;
pub mod model;
pub mod types;
pub mod validate;

pub use config::{ClientSettings, LocationCreateRoute};
pub use error::ValidationError;
pub use model::{
    NewDevice, NewLocation, Protocol, SnmpAuthProtocol, SnmpPrivProtocol, SnmpVersion,
    TypeOption, Worker,
};
pub use types::{Fields, MutationRequest, ResourceKind, Verb};
