//! # Error Types
//!
//! Structured error types for hailnet_core. The calculation engine itself
//! never fails (degenerate inputs propagate as NaN/Infinity), so these errors
//! cover the surfaces around it: input-constraint validation, the state
//! store, configuration, the password gate and quotation export.
//!
//! ## Example
//!
//! ```rust
//! use hailnet_core::errors::{CalcError, CalcResult};
//!
//! fn validate_rows(row_count: u32) -> CalcResult<()> {
//!     if row_count < 2 {
//!         return Err(CalcError::invalid_input(
//!             "row_count",
//!             row_count.to_string(),
//!             "At least 2 rows are required",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for hailnet_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for estimator operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value violates an input constraint
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A catalog option (net type, margin tier, package...) was not recognised
    #[error("Unknown {kind}: '{value}'")]
    UnknownOption { kind: String, value: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// The state store is locked by another process
    #[error("File locked: '{path}' is locked by {locked_by}")]
    FileLocked { path: String, locked_by: String },

    /// JSON/TOML serialization or deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Stored state was written by an incompatible schema version
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Configuration file could not be used
    #[error("Configuration error in '{path}': {reason}")]
    ConfigError { path: String, reason: String },

    /// Password rejected
    #[error("Authentication failed: {attempts_remaining} attempt(s) remaining")]
    AuthFailed { attempts_remaining: u32 },

    /// Login attempts are rejected until the lockout expires
    #[error("Access locked, retry in {remaining_minutes} minute(s)")]
    Locked { remaining_minutes: i64 },

    /// No valid session for a gated operation
    #[error("Session expired or not authenticated")]
    SessionExpired,

    /// The password gate has no stored password yet
    #[error("No password has been set up for the advanced calculator")]
    NotInitialized,

    /// Quotation document generation failed
    #[error("Export failed: {reason}")]
    ExportFailed { reason: String },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
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

    /// Create an UnknownOption error
    pub fn unknown_option(kind: impl Into<String>, value: impl Into<String>) -> Self {
        CalcError::UnknownOption {
            kind: kind.into(),
            value: value.into(),
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

    /// Create a SerializationError from any displayable error
    pub fn serialization(reason: impl std::fmt::Display) -> Self {
        CalcError::SerializationError {
            reason: reason.to_string(),
        }
    }

    /// Create an ExportFailed error
    pub fn export_failed(reason: impl Into<String>) -> Self {
        CalcError::ExportFailed {
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry later)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CalcError::FileLocked { .. }
                | CalcError::AuthFailed { .. }
                | CalcError::Locked { .. }
                | CalcError::ExportFailed { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::UnknownOption { .. } => "UNKNOWN_OPTION",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::FileLocked { .. } => "FILE_LOCKED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::ConfigError { .. } => "CONFIG_ERROR",
            CalcError::AuthFailed { .. } => "AUTH_FAILED",
            CalcError::Locked { .. } => "LOCKED",
            CalcError::SessionExpired => "SESSION_EXPIRED",
            CalcError::NotInitialized => "NOT_INITIALIZED",
            CalcError::ExportFailed { .. } => "EXPORT_FAILED",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_input("row_spacing_m", "0.2", "Row spacing must be at least 0.5 m");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidInput\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::unknown_option("net type", "T70").error_code(), "UNKNOWN_OPTION");
        assert_eq!(CalcError::SessionExpired.error_code(), "SESSION_EXPIRED");
        assert_eq!(CalcError::export_failed("disk full").error_code(), "EXPORT_FAILED");
        assert_eq!(CalcError::NotInitialized.error_code(), "NOT_INITIALIZED");
    }

    #[test]
    fn test_recoverable() {
        assert!(CalcError::Locked { remaining_minutes: 3 }.is_recoverable());
        assert!(!CalcError::SessionExpired.is_recoverable());
    }

    #[test]
    fn test_display_messages() {
        let err = CalcError::AuthFailed { attempts_remaining: 2 };
        assert_eq!(err.to_string(), "Authentication failed: 2 attempt(s) remaining");
    }
}
