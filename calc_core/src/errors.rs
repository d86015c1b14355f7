//! # Error Types
//!
//! Structured error types for calc_core. Every failure is a per-call
//! condition: callers decide whether to re-prompt, fall back to a default,
//! or render a "not found" page. Nothing here is fatal to the process.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::errors::{CalcError, CalcResult};
//!
//! fn validate_value(value: f64) -> CalcResult<f64> {
//!     if !value.is_finite() {
//!         return Err(CalcError::invalid_input(
//!             "value",
//!             value.to_string(),
//!             "Value must be a finite number",
//!         ));
//!     }
//!     Ok(value)
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for calc_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for conversion and fraction operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// Value is not finite, not parseable, or outside a documented range
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A unit does not belong to the stated category
    #[error("Unit mismatch: '{unit}' in {category} - {reason}")]
    UnitMismatch {
        category: String,
        unit: String,
        reason: String,
    },

    /// Catalog lookup failed
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// Catalog data violates a load-time invariant
    #[error("Invalid catalog data in {category}: {reason}")]
    InvalidCatalog { category: String, reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// Ledger file is locked by another process
    #[error("File locked: '{path}' is in use by another process")]
    FileLocked { path: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Ledger file schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a UnitMismatch error
    pub fn unit_mismatch(category: impl Into<String>, unit: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::UnitMismatch {
            category: category.into(),
            unit: unit.into(),
            reason: reason.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        CalcError::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Create an InvalidCatalog error
    pub fn invalid_catalog(category: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidCatalog {
            category: category.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for rejecting a non-finite number
    pub(crate) fn non_finite(field: &str, value: f64) -> Self {
        CalcError::invalid_input(field, value.to_string(), "Value must be a finite number")
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CalcError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::UnitMismatch { .. } => "UNIT_MISMATCH",
            CalcError::NotFound { .. } => "NOT_FOUND",
            CalcError::InvalidCatalog { .. } => "INVALID_CATALOG",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::FileLocked { .. } => "FILE_LOCKED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::SerializationError { reason: e.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::unit_mismatch("length", "kilogram", "Unit is not part of this category");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"UnitMismatch\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::invalid_input("value", "NaN", "bad").error_code(), "INVALID_INPUT");
        assert_eq!(CalcError::not_found("Unit", "furlong").error_code(), "NOT_FOUND");
        assert_eq!(CalcError::unit_mismatch("speed", "byte", "x").error_code(), "UNIT_MISMATCH");
    }

    #[test]
    fn test_display_messages() {
        let err = CalcError::not_found("Category", "luminosity");
        assert_eq!(err.to_string(), "Category not found: luminosity");

        let err = CalcError::non_finite("value", f64::NAN);
        assert!(err.to_string().contains("finite"));
    }

    #[test]
    fn test_only_lock_is_recoverable() {
        assert!(CalcError::FileLocked { path: "recent.json".into() }.is_recoverable());
        assert!(!CalcError::not_found("Unit", "x").is_recoverable());
    }
}
