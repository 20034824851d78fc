use thiserror::Error;

/// Raised by the draft -> record transition. A record that fails validation
/// never reaches the store.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingRequiredField { field: &'static str },

    #[error("mode must be online, offline, or hybrid, got \"{value}\"")]
    InvalidEnumValue { value: String },

    #[error("invalid date value: \"{value}\"")]
    InvalidDate { value: String },

    #[error("invalid time value: \"{value}\"")]
    InvalidTime { value: String },

    #[error("{field} must contain at least one item")]
    EmptyCollectionField { field: &'static str },

    #[error("\"{value}\" is not a valid email address")]
    InvalidEmail { value: String },
}
