//! # Error Types
//!
//! Structured error types for civil_core. These errors are designed to be
//! informative for both humans and LLMs, providing enough context to
//! understand and fix issues programmatically.
//!
//! Rate lookups that miss (unknown material, labor role, equipment type) are
//! *not* errors here: they come back as an error-shaped
//! [`CostResult`](crate::estimating::CostResult) so a batch estimate can skip
//! them. `CalcError` is for caller mistakes on well-defined domains.
//!
//! ## Example
//!
//! ```rust
//! use civil_core::errors::{CalcError, CalcResult};
//!
//! fn validate_depth_ratio(depth_ratio: f64) -> CalcResult<()> {
//!     if !(0.01..=1.0).contains(&depth_ratio) {
//!         return Err(CalcError::invalid_input(
//!             "depth_ratio",
//!             depth_ratio.to_string(),
//!             "depth_ratio must be between 0.01 and 1.0",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_depth_ratio(1.5).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for civil_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation operations.
///
/// Each variant provides specific context about what went wrong,
/// enabling programmatic error handling by LLMs and other consumers.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (out of range, unknown tag, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Conversion category not recognized
    #[error("Unknown category '{category}'. Choose from: {}", available.join(", "))]
    UnknownCategory {
        category: String,
        available: Vec<String>,
    },

    /// Unit key not present in the category's factor table
    #[error("Unknown unit '{unit}' in category '{category}'. Available: {}", available.join(", "))]
    UnknownUnit {
        category: String,
        unit: String,
        available: Vec<String>,
    },

    /// Tool name not present in the registry
    #[error("Unsupported tool '{name}'")]
    UnsupportedTool { name: String },

    /// Request or data file JSON did not deserialize
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Fault on our side, e.g. a result that would not serialize
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create an UnknownCategory error
    pub fn unknown_category<S: AsRef<str>>(category: impl Into<String>, available: &[S]) -> Self {
        CalcError::UnknownCategory {
            category: category.into(),
            available: available.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    /// Create an UnknownUnit error
    pub fn unknown_unit<S: AsRef<str>>(
        category: impl Into<String>,
        unit: impl Into<String>,
        available: &[S],
    ) -> Self {
        CalcError::UnknownUnit {
            category: category.into(),
            unit: unit.into(),
            available: available.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    /// Create an UnsupportedTool error
    pub fn unsupported_tool(name: impl Into<String>) -> Self {
        CalcError::UnsupportedTool { name: name.into() }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        CalcError::Internal {
            message: message.into(),
        }
    }

    /// Whether the caller sent something wrong (maps to a 4xx-style response).
    ///
    /// `Internal` is the only variant that indicates a fault on our side.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CalcError::Internal { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::UnknownCategory { .. } => "UNKNOWN_CATEGORY",
            CalcError::UnknownUnit { .. } => "UNKNOWN_UNIT",
            CalcError::UnsupportedTool { .. } => "UNSUPPORTED_TOOL",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error =
            CalcError::invalid_input("depth_ratio", "1.5", "depth_ratio must be between 0.01 and 1.0");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_field("od_ft").error_code(), "MISSING_FIELD");
        assert_eq!(CalcError::unsupported_tool("fly").error_code(), "UNSUPPORTED_TOOL");
    }

    #[test]
    fn test_unknown_unit_lists_available_keys() {
        let error = CalcError::unknown_unit("volume", "furlong", &["cy", "cf"]);
        let message = error.to_string();
        assert!(message.contains("furlong"));
        assert!(message.contains("cy, cf"));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(CalcError::unknown_category("magic", &["volume"]).is_client_error());
        assert!(!CalcError::Internal { message: "boom".into() }.is_client_error());
    }

    #[test]
    fn test_internal_is_not_a_client_error() {
        assert!(!CalcError::internal("result did not serialize").is_client_error());
        assert_eq!(CalcError::internal("x").error_code(), "INTERNAL_ERROR");
        assert!(CalcError::SerializationError { reason: "bad json".to_string() }.is_client_error());
    }
}
