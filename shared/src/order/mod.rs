//! Order domain types
//!
//! - [`OrderEntity`] / [`OrderItemEntity`]: the order aggregate
//! - [`OrderPriceValue`] / [`PriceVo`]: integer-cent price value objects
//! - [`OrderContext`]: typed per-order-type context

pub mod entity;
pub mod price;
pub mod types;

// Re-exports
pub use entity::{OrderEntity, OrderItemEntity};
pub use price::{OrderPriceValue, PriceError, PriceVo};
pub use types::*;
