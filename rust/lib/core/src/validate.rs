//! Field-level checks shared by the mutation payloads.
//!
//! Each helper returns the first problem it finds; callers chain them
//! with `?` so a payload reports one error at a time.

use std::net::Ipv4Addr;
use std::ops::RangeInclusive;

use crate::ValidationError;

/// Identifiers are positive integers; zero never names a record upstream.
pub fn positive_id(field: &str, id: u64) -> Result<u64, ValidationError> {
    if id == 0 {
        return Err(ValidationError::new(
            field,
            format!("{} must be a positive integer", field),
        ));
    }
    Ok(id)
}

/// Non-empty after trimming.
pub fn required(field: &str, label: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, format!("{} is required", label)));
    }
    Ok(())
}

/// At most `max` characters (not bytes).
pub fn max_chars(field: &str, label: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::new(
            field,
            format!("{} must not exceed {} characters", label, max),
        ));
    }
    Ok(())
}

/// Value inside an inclusive float range. NaN is always out of range.
pub fn in_range(
    field: &str,
    label: &str,
    value: f64,
    range: RangeInclusive<f64>,
) -> Result<(), ValidationError> {
    if !range.contains(&value) {
        return Err(ValidationError::new(
            field,
            format!(
                "{} must be between {} and {}",
                label,
                range.start(),
                range.end()
            ),
        ));
    }
    Ok(())
}

/// Dotted-quad IPv4 address.
pub fn ipv4(field: &str, value: &str) -> Result<(), ValidationError> {
    value
        .parse::<Ipv4Addr>()
        .map(|_| ())
        .map_err(|_| ValidationError::new(field, "Invalid IP address format"))
}
