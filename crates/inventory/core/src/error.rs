//! Common error infrastructure for inventory-core.
//!
//! Domain errors (`PolicyError`, `ContainerError`, `ProtocolError`,
//! `AccessDenied`) live next to the code that raises them. This module holds
//! the classification shared by all of them so the runtime can decide how to
//! react (drop, log, resync, abort) without matching on every variant.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the protocol heals itself (e.g. a resync restarts)
/// - **Validation**: the request is rejected and nothing changes
/// - **Internal**: local state diverged from what it should be
/// - **Fatal**: configuration is unusable, startup must abort
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorSeverity {
    /// Recoverable error - retried automatically by the protocol.
    ///
    /// Examples: segment out of order, stale transfer
    Recoverable,

    /// Validation error - invalid request, should not retry without changes.
    ///
    /// Examples: capacity exceeded, kind filtered out, access denied
    Validation,

    /// Internal error - unexpected state inconsistency.
    ///
    /// Examples: derived index missing an item the container holds
    Internal,

    /// Fatal error - cannot continue with this configuration.
    ///
    /// Examples: a kind without a registered policy
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates a bug or divergence.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all inventory-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
/// - Error codes are stable strings suitable for metrics and tests
pub trait InventoryError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_classification() {
        assert!(ErrorSeverity::Recoverable.is_recoverable());
        assert!(!ErrorSeverity::Validation.is_recoverable());
        assert!(ErrorSeverity::Internal.is_internal());
        assert!(ErrorSeverity::Fatal.is_internal());
        assert!(!ErrorSeverity::Validation.is_internal());
        assert_eq!(ErrorSeverity::Fatal.as_str(), "fatal");
    }
}
