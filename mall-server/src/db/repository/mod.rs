//! Repository Module
//!
//! Contracts for the transactional store the order core writes through.
//! Every mutating method that guards a state transition is a conditional
//! update: it only touches rows still in the expected state and reports how
//! many it changed, so concurrent writers cannot flip the same row twice.

pub mod coupon;
pub mod group_buy;
pub mod order;
pub mod product;
pub mod seckill;
pub mod stock;

// Re-exports
pub use coupon::CouponRepository;
pub use group_buy::GroupBuyRepository;
pub use order::{OrderRepository, PersistedOrder};
pub use product::ProductRepository;
pub use seckill::SeckillRepository;
pub use stock::{StockKey, StockRepository};

use thiserror::Error;

/// Repository error types
#[derive(Debug, Clone, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
