use thiserror::Error;

/// Structurally invalid input. Always a caller bug, never a business outcome.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("invalid range: {0}")]
    InvalidRange(String),
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid policy: {0}")]
    Invalid(#[from] ValidationError),
}

pub(crate) fn non_negative(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(value)
}

pub(crate) fn optional_non_negative(
    field: &'static str,
    value: Option<f64>,
) -> Result<Option<f64>, ValidationError> {
    value.map(|v| non_negative(field, v)).transpose()
}
