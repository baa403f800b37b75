//! Unified error codes for the checkout services
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Product errors
//! - 2xxx: Hold / stock errors
//! - 3xxx: Order errors
//! - 4xxx: Payment / webhook errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Product ====================
    /// Product not found
    ProductNotFound = 1001,

    // ==================== 2xxx: Hold / stock ====================
    /// Hold not found
    HoldNotFound = 2001,
    /// Not enough available stock for the requested quantity
    InsufficientStock = 2002,
    /// Hold has expired
    HoldExpired = 2003,
    /// Hold has already been converted into an order
    HoldAlreadyUsed = 2004,
    /// Hold has already been released
    HoldReleased = 2005,
    /// Lock wait timed out or deadlock retries exhausted
    HighContention = 2006,
    /// Requested quantity is not a positive integer
    InvalidQuantity = 2007,

    // ==================== 3xxx: Order ====================
    /// Order not found
    OrderNotFound = 3001,
    /// Order status transition is not allowed
    InvalidTransition = 3002,
    /// Paid orders cannot be cancelled
    CannotCancelPaid = 3003,

    // ==================== 4xxx: Payment / webhook ====================
    /// Webhook payment_status is neither "success" nor "failed"
    InvalidPaymentStatus = 4001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Cache / key-value store error
    CacheError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",

            // Product
            ErrorCode::ProductNotFound => "Product not found",

            // Hold / stock
            ErrorCode::HoldNotFound => "Hold not found",
            ErrorCode::InsufficientStock => "Insufficient stock",
            ErrorCode::HoldExpired => "Hold has expired",
            ErrorCode::HoldAlreadyUsed => "Hold has already been used",
            ErrorCode::HoldReleased => "Hold has already been released",
            ErrorCode::HighContention => "High contention, please retry",
            ErrorCode::InvalidQuantity => "Quantity must be a positive integer",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidTransition => "Order status transition not allowed",
            ErrorCode::CannotCancelPaid => "Paid orders cannot be cancelled",

            // Payment / webhook
            ErrorCode::InvalidPaymentStatus => "Invalid payment status",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::CacheError => "Cache error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),

            // Product
            1001 => Ok(ErrorCode::ProductNotFound),

            // Hold / stock
            2001 => Ok(ErrorCode::HoldNotFound),
            2002 => Ok(ErrorCode::InsufficientStock),
            2003 => Ok(ErrorCode::HoldExpired),
            2004 => Ok(ErrorCode::HoldAlreadyUsed),
            2005 => Ok(ErrorCode::HoldReleased),
            2006 => Ok(ErrorCode::HighContention),
            2007 => Ok(ErrorCode::InvalidQuantity),

            // Order
            3001 => Ok(ErrorCode::OrderNotFound),
            3002 => Ok(ErrorCode::InvalidTransition),
            3003 => Ok(ErrorCode::CannotCancelPaid),

            // Payment / webhook
            4001 => Ok(ErrorCode::InvalidPaymentStatus),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::CacheError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            other => Err(InvalidErrorCode(other)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::InsufficientStock.code(), 2002);
        assert_eq!(ErrorCode::HighContention.code(), 2006);
        assert_eq!(ErrorCode::InvalidPaymentStatus.code(), 4001);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_round_trip() {
        for code in [
            ErrorCode::ValidationFailed,
            ErrorCode::ProductNotFound,
            ErrorCode::HoldExpired,
            ErrorCode::HoldAlreadyUsed,
            ErrorCode::OrderNotFound,
            ErrorCode::CannotCancelPaid,
            ErrorCode::InvalidPaymentStatus,
            ErrorCode::DatabaseError,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_invalid_code() {
        let err = ErrorCode::try_from(4242).unwrap_err();
        assert_eq!(err, InvalidErrorCode(4242));
        assert_eq!(err.to_string(), "invalid error code: 4242");
    }

    #[test]
    fn test_serde_as_u16() {
        let json = serde_json::to_string(&ErrorCode::InsufficientStock).unwrap();
        assert_eq!(json, "2002");

        let code: ErrorCode = serde_json::from_str("2003").unwrap();
        assert_eq!(code, ErrorCode::HoldExpired);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::HighContention.is_success());
    }
}
