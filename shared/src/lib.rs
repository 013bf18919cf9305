//! Shared types for the mall backend
//!
//! Types used by the order pipeline and the promotion services:
//! error codes, the order aggregate with its price value objects,
//! promotion models and id/number generators.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};
