//! Form status handling for NMS dashboard mutations.
//!
//! A [`FormController`] wraps one create/edit/delete call and exposes the
//! `{phase, message}` banner a form renders, closing the form shortly after
//! a success.

mod action;
mod controller;
mod status;

#[cfg(test)]
mod scenario_test;

pub use action::FormAction;
pub use controller::{CloseHandler, FormController, FormOptions, SubscriptionId, DEFAULT_DISMISS_AFTER};
pub use status::{FormPhase, FormStatus};
