//! Range checks for settings and engine configuration.

use thiserror::Error;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Parameter value out of range.
    #[error("parameter '{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the parameter.
        param: String,
        /// The value that was out of range.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// A value that no range describes, e.g. a zero sample rate.
    #[error("invalid value for '{param}': {reason}")]
    Invalid {
        /// Name of the parameter.
        param: String,
        /// Why the value is unusable.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Inclusive numeric range of a named field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRange {
    /// Serialized field name.
    pub name: &'static str,
    /// Minimum allowed value.
    pub min: f32,
    /// Maximum allowed value.
    pub max: f32,
}

impl FieldRange {
    /// Range `[min, max]` for `name`.
    pub const fn new(name: &'static str, min: f32, max: f32) -> Self {
        Self { name, min, max }
    }

    /// `Ok` when `value` lies in the range. NaN never does.
    pub fn check(&self, value: f32) -> ValidationResult<()> {
        if (self.min..=self.max).contains(&value) {
            Ok(())
        } else {
            Err(ValidationError::OutOfRange {
                param: self.name.to_string(),
                value,
                min: self.min,
                max: self.max,
            })
        }
    }

    /// Clamp `value` into the range.
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}
