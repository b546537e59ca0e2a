//! Shared threshold validation helpers.
//!
//! Range checks applied to threshold sets before the server starts.

use crate::error::CoreError;

/// Validate that a value falls within `[0.0, 1.0]`.
///
/// Returns a `CoreError::Validation` naming the field if out of range.
pub fn validate_unit_range(value: f64, name: &str) -> Result<(), CoreError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{name} must be between 0.0 and 1.0, got {value}"
        )));
    }
    Ok(())
}

/// Validate that an angle threshold lies within `(0, 180]` degrees.
pub fn validate_angle_degrees(value: f64, name: &str) -> Result<(), CoreError> {
    if !(value > 0.0 && value <= 180.0) {
        return Err(CoreError::Validation(format!(
            "{name} must be in (0, 180] degrees, got {value}"
        )));
    }
    Ok(())
}
