//! Unified error codes for the mall backend
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 6xxx: Product / stock errors
//! - 7xxx: Promotion errors (coupon, group-buy, seckill)
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has already been paid
    OrderAlreadyPaid = 4002,
    /// Order is empty
    OrderEmpty = 4007,
    /// Order type has no registered strategy
    OrderTypeUnknown = 4010,
    /// Declared pay amount differs from the computed one
    PriceChanged = 4011,
    /// Order is not in a state that allows the operation
    OrderStatusInvalid = 4012,

    // ==================== 6xxx: Product ====================
    /// Product is out of stock
    ProductOutOfStock = 6003,
    /// Product is offline
    ProductOffline = 6004,
    /// SKU does not belong to the product
    SkuMismatch = 6005,
    /// Stock lock could not be acquired in time
    StockBusy = 6006,

    // ==================== 7xxx: Promotion ====================
    /// Coupon not owned, already used or unknown
    CouponUnavailable = 7001,
    /// Order does not reach the coupon threshold
    CouponThresholdNotMet = 7002,
    /// Coupons cannot be stacked on promotion orders
    CouponNotStackable = 7003,
    /// Group-buy activity cannot be joined
    GroupBuyNotJoinable = 7101,
    /// SKU is not part of the group-buy activity
    GroupBuySkuMismatch = 7102,
    /// Group-buy activity stock insufficient
    GroupBuyStockInsufficient = 7103,
    /// Member already joined the activity
    GroupBuyDuplicateJoin = 7104,
    /// Group-buy activity or group not found
    GroupBuyNotFound = 7105,
    /// Seckill activity is not running
    SeckillNotActive = 7201,
    /// Seckill per-member limit exceeded
    SeckillLimitExceeded = 7202,
    /// Seckill activity not found
    SeckillNotFound = 7203,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyPaid => "Order has already been paid",
            ErrorCode::OrderEmpty => "Order is empty",
            ErrorCode::OrderTypeUnknown => "Order type is not supported",
            ErrorCode::PriceChanged => "Price has changed",
            ErrorCode::OrderStatusInvalid => "Order status does not allow this operation",

            // Product
            ErrorCode::ProductOutOfStock => "Product is out of stock",
            ErrorCode::ProductOffline => "Product is offline",
            ErrorCode::SkuMismatch => "SKU does not match product",
            ErrorCode::StockBusy => "Stock is busy, retry later",

            // Promotion
            ErrorCode::CouponUnavailable => "Coupon is unavailable or already used",
            ErrorCode::CouponThresholdNotMet => "Coupon threshold not met",
            ErrorCode::CouponNotStackable => "Coupons cannot be used on promotion orders",
            ErrorCode::GroupBuyNotJoinable => "Group-buy activity cannot be joined",
            ErrorCode::GroupBuySkuMismatch => "SKU is not part of the group-buy activity",
            ErrorCode::GroupBuyStockInsufficient => "Group-buy stock insufficient",
            ErrorCode::GroupBuyDuplicateJoin => "Member already joined this activity",
            ErrorCode::GroupBuyNotFound => "Group-buy not found",
            ErrorCode::SeckillNotActive => "Seckill activity is not running",
            ErrorCode::SeckillLimitExceeded => "Seckill purchase limit exceeded",
            ErrorCode::SeckillNotFound => "Seckill activity not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into [`ErrorCode`]
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
        let code = match value {
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::AlreadyExists,

            4001 => ErrorCode::OrderNotFound,
            4002 => ErrorCode::OrderAlreadyPaid,
            4007 => ErrorCode::OrderEmpty,
            4010 => ErrorCode::OrderTypeUnknown,
            4011 => ErrorCode::PriceChanged,
            4012 => ErrorCode::OrderStatusInvalid,

            6003 => ErrorCode::ProductOutOfStock,
            6004 => ErrorCode::ProductOffline,
            6005 => ErrorCode::SkuMismatch,
            6006 => ErrorCode::StockBusy,

            7001 => ErrorCode::CouponUnavailable,
            7002 => ErrorCode::CouponThresholdNotMet,
            7003 => ErrorCode::CouponNotStackable,
            7101 => ErrorCode::GroupBuyNotJoinable,
            7102 => ErrorCode::GroupBuySkuMismatch,
            7103 => ErrorCode::GroupBuyStockInsufficient,
            7104 => ErrorCode::GroupBuyDuplicateJoin,
            7105 => ErrorCode::GroupBuyNotFound,
            7201 => ErrorCode::SeckillNotActive,
            7202 => ErrorCode::SeckillLimitExceeded,
            7203 => ErrorCode::SeckillNotFound,

            9001 => ErrorCode::InternalError,
            9002 => ErrorCode::DatabaseError,

            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}
