//! Unified error handling for the fence-registry library.
//!
//! This module provides a consistent error type for all registry operations,
//! replacing mixed error handling patterns (Option, panic, silent failures).

use std::fmt;

/// Unified error type for fence-registry operations.
#[derive(Debug, Clone, PartialEq)]
pub enum FenceError {
    /// The record store already holds the maximum number of fences
    CapacityExceeded { capacity: usize },
    /// A record with this identifier already exists in the store
    DuplicateIdentifier { identifier: String },
    /// No record (or active registration) matches this identifier
    NotFound { identifier: String },
    /// The platform has no geofence monitoring capability
    MonitoringUnsupported,
    /// The platform refused or failed a monitoring registration
    MonitoringFailed {
        identifier: String,
        message: String,
    },
    /// Blob store read/write error
    Persistence { message: String },
    /// A persisted record blob could not be decoded
    Deserialization { message: String },
}

impl fmt::Display for FenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenceError::CapacityExceeded { capacity } => {
                write!(f, "Fence store is full ({} regions maximum)", capacity)
            }
            FenceError::DuplicateIdentifier { identifier } => {
                write!(f, "A fence with identifier '{}' already exists", identifier)
            }
            FenceError::NotFound { identifier } => {
                write!(f, "No fence found for identifier '{}'", identifier)
            }
            FenceError::MonitoringUnsupported => {
                write!(f, "Geofencing is not supported on this device")
            }
            FenceError::MonitoringFailed {
                identifier,
                message,
            } => {
                write!(
                    f,
                    "Monitoring failed for region '{}': {}",
                    identifier, message
                )
            }
            FenceError::Persistence { message } => {
                write!(f, "Persistence error: {}", message)
            }
            FenceError::Deserialization { message } => {
                write!(f, "Record deserialization failed: {}", message)
            }
        }
    }
}

impl std::error::Error for FenceError {}

/// Result type alias for fence-registry operations.
pub type Result<T> = std::result::Result<T, FenceError>;

impl FenceError {
    /// Build a `NotFound` error for an identifier.
    pub fn not_found(identifier: &str) -> Self {
        FenceError::NotFound {
            identifier: identifier.to_string(),
        }
    }

    /// Build a `Persistence` error from any displayable cause.
    pub fn persistence(cause: impl fmt::Display) -> Self {
        FenceError::Persistence {
            message: cause.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FenceError::CapacityExceeded { capacity: 20 };
        assert!(err.to_string().contains("20 regions"));

        let err = FenceError::not_found("abc-123");
        assert!(err.to_string().contains("abc-123"));
    }

    #[test]
    fn test_persistence_helper_wraps_cause() {
        let err = FenceError::persistence("disk unavailable");
        assert!(matches!(err, FenceError::Persistence { .. }));
        assert!(err.to_string().contains("disk unavailable"));
    }
}
