// File: rhtmx-validity/core/src/error.rs
// Purpose: Error taxonomy for the validity observer

use thiserror::Error;

/// Errors raised by the validity observer
///
/// Everything except [`ValidityError::Validator`] and [`ValidityError::Message`]
/// is a usage error: a programming mistake that should surface during development.
#[derive(Debug, Error)]
pub enum ValidityError {
    #[error("no form is being observed; call observe() first")]
    NotObserving,

    #[error("a different form is already being observed; unobserve it first")]
    AlreadyObserving,

    #[error("error message for field `{field}` must be text unless it is rendered")]
    NonTextMessage { field: String },

    #[error("radio group `{field}` must be wrapped in an element with role=\"radiogroup\"")]
    MissingRadioGroup { field: String },

    #[error("error message for field `{field}` could not be computed: {source}")]
    Message {
        field: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("custom validation for field `{field}` failed: {source}")]
    Validator {
        field: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ValidityError {
    /// Whether this is a programming mistake rather than a failure of user code
    pub fn is_usage(&self) -> bool {
        !matches!(self, ValidityError::Validator { .. } | ValidityError::Message { .. })
    }
}

pub type Result<T> = std::result::Result<T, ValidityError>;
