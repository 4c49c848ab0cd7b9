//! Interrupt subsystem error type
//!
//! Every recoverable failure is an input or configuration problem; nothing
//! here is transient, so callers never retry.

use core::fmt;

/// Errors returned by interrupt subsystem operations
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IrqError {
    /// Interrupt number or priority outside its valid domain
    InvalidParameter,
    /// The operation needs the relocated vector table, which is not active
    NotInitialized,
    /// The feature behind the operation is not part of this build
    InvalidConfiguration,
}

impl IrqError {
    /// Numeric status code, for callers that report errors as integers
    pub const fn code(self) -> i32 {
        match self {
            Self::InvalidParameter => -1,
            Self::NotInitialized => -2,
            Self::InvalidConfiguration => -3,
        }
    }
}

impl fmt::Display for IrqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter => write!(f, "Invalid interrupt number or priority"),
            Self::NotInitialized => write!(f, "Vector table not relocated"),
            Self::InvalidConfiguration => write!(f, "Feature not configured"),
        }
    }
}
