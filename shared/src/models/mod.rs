//! Data models
//!
//! Snapshots and rows consumed by the order pipeline and the promotion services.
//! All IDs are `i64`; all money fields are integer cents.

pub mod coupon;
pub mod group_buy;
pub mod product;
pub mod seckill;

// Re-exports
pub use coupon::*;
pub use group_buy::*;
pub use product::*;
pub use seckill::*;
