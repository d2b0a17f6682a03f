//! Store error types.
//!
//! Covers every failure the store client, the catalog and the row codec can
//! surface. Benign outcomes (empty scans, deleting an absent row, a filter
//! with no matches) are not errors and never appear here.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes for categorizing errors.
///
/// These codes are stable and travel over the wire alongside the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Internal error (bug).
    Internal = 0x0000,
    /// Caller supplied invalid input.
    InvalidInput = 0x0001,

    // Transport errors (0x0100 - 0x01FF)
    /// Store could not be reached.
    Unavailable = 0x0100,
    /// Malformed frame or unexpected response.
    Protocol = 0x0101,

    // Catalog errors (0x0200 - 0x02FF)
    /// Table does not exist.
    TableNotFound = 0x0200,
    /// Table already exists.
    TableExists = 0x0201,
    /// Table is disabled.
    TableDisabled = 0x0202,
    /// Table is still enabled.
    TableEnabled = 0x0203,
    /// Column family is not declared on the table.
    NoSuchFamily = 0x0204,
    /// Column family name is not usable.
    InvalidFamily = 0x0205,

    // Data errors (0x0300 - 0x03FF)
    /// Bytes are not valid text.
    Encoding = 0x0300,
    /// Column qualifier carries no family prefix.
    MalformedQualifier = 0x0301,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "Transport",
            0x02 => "Catalog",
            0x03 => "Data",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The main error type for widecol.
///
/// Every variant carries owned strings only, so the whole error serializes
/// and can be shipped from the server to a remote client as-is.
///
/// # Example
///
/// ```rust
/// use widecol_common::error::{ErrorCode, StoreError, StoreResult};
///
/// fn open(table: &str) -> StoreResult<()> {
///     Err(StoreError::table_not_found(table))
/// }
///
/// let err = open("orders").unwrap_err();
/// assert_eq!(err.code(), ErrorCode::TableNotFound);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum StoreError {
    // ==========================================================================
    // General Errors
    // ==========================================================================
    /// Internal error - this indicates a bug.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    /// Invalid input from the caller.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Error message.
        message: String,
    },

    // ==========================================================================
    // Transport Errors
    // ==========================================================================
    /// The store could not be reached or the connection broke mid-request.
    #[error("store at {addr} unavailable: {reason}")]
    Unavailable {
        /// Address that was dialled.
        addr: String,
        /// Underlying failure.
        reason: String,
    },

    /// Protocol violation on the wire.
    #[error("protocol error: {message}")]
    Protocol {
        /// Error message.
        message: String,
    },

    // ==========================================================================
    // Catalog Errors
    // ==========================================================================
    /// Table not found.
    #[error("table '{table}' not found")]
    TableNotFound {
        /// The missing table.
        table: String,
    },

    /// Table already exists.
    #[error("table '{table}' already exists")]
    TableExists {
        /// The existing table.
        table: String,
    },

    /// Table is disabled.
    #[error("table '{table}' is disabled")]
    TableDisabled {
        /// The disabled table.
        table: String,
    },

    /// Table must be disabled first.
    #[error("table '{table}' is enabled, disable it first")]
    TableEnabled {
        /// The enabled table.
        table: String,
    },

    /// Column family not declared on the table.
    #[error("column family '{family}' does not exist in table '{table}'")]
    NoSuchFamily {
        /// The table name.
        table: String,
        /// The unknown family.
        family: String,
    },

    /// Column family name rejected.
    #[error("invalid column family '{family}': {reason}")]
    InvalidFamily {
        /// The rejected family name.
        family: String,
        /// Why it was rejected.
        reason: String,
    },

    // ==========================================================================
    // Data Errors
    // ==========================================================================
    /// Bytes could not be decoded as UTF-8 text.
    #[error("encoding error: {message}")]
    Encoding {
        /// Error message.
        message: String,
    },

    /// Column qualifier without a family separator.
    #[error("malformed column qualifier '{qualifier}': missing family separator")]
    MalformedQualifier {
        /// The qualifier, lossily decoded.
        qualifier: String,
    },
}

impl StoreError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Internal { .. } => ErrorCode::Internal,
            Self::InvalidInput { .. } => ErrorCode::InvalidInput,
            Self::Unavailable { .. } => ErrorCode::Unavailable,
            Self::Protocol { .. } => ErrorCode::Protocol,
            Self::TableNotFound { .. } => ErrorCode::TableNotFound,
            Self::TableExists { .. } => ErrorCode::TableExists,
            Self::TableDisabled { .. } => ErrorCode::TableDisabled,
            Self::TableEnabled { .. } => ErrorCode::TableEnabled,
            Self::NoSuchFamily { .. } => ErrorCode::NoSuchFamily,
            Self::InvalidFamily { .. } => ErrorCode::InvalidFamily,
            Self::Encoding { .. } => ErrorCode::Encoding,
            Self::MalformedQualifier { .. } => ErrorCode::MalformedQualifier,
        }
    }

    /// Returns true if a caller may reasonably retry the operation.
    ///
    /// widecol itself never retries; this is only a hint.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(addr: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Unavailable {
            addr: addr.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a protocol error.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a table-not-found error.
    #[must_use]
    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
        }
    }

    /// Creates an encoding error.
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = StoreError::table_not_found("products");
        assert_eq!(err.code(), ErrorCode::TableNotFound);
        assert_eq!(err.code().category(), "Catalog");
        assert_eq!(ErrorCode::Encoding.category(), "Data");
        assert_eq!(ErrorCode::Unavailable.as_u16(), 0x0100);
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::NoSuchFamily {
            table: "products".to_string(),
            family: "meta".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "column family 'meta' does not exist in table 'products'"
        );

        let err = StoreError::unavailable("localhost:9090", "connection refused");
        assert_eq!(
            err.to_string(),
            "store at localhost:9090 unavailable: connection refused"
        );
    }

    #[test]
    fn test_retryable() {
        assert!(StoreError::unavailable("h:1", "down").is_retryable());
        assert!(!StoreError::table_not_found("t").is_retryable());
        assert!(!StoreError::encoding("bad utf-8").is_retryable());
    }

    #[test]
    fn test_serde_preserves_variant() {
        let err = StoreError::TableDisabled {
            table: "orders".to_string(),
        };
        let json = serde_json::to_string(&err).unwrap();
        let back: StoreError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }
}
