//! Stock counters
//!
//! Only `OrderStockService` writes through this contract.

use super::RepoResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 库存计数器键
///
/// 派生的 `Ord` 决定加锁顺序 (先 SKU 后秒杀活动，各自按 ID 升序)。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum StockKey {
    /// SKU 可售库存
    Sku(i64),
    /// 秒杀活动库存
    Seckill(i64),
}

impl fmt::Display for StockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockKey::Sku(id) => write!(f, "sku:{}", id),
            StockKey::Seckill(id) => write!(f, "seckill:{}", id),
        }
    }
}

#[async_trait]
pub trait StockRepository: Send + Sync {
    async fn available(&self, key: StockKey) -> RepoResult<i64>;

    /// 条件扣减：可用量 >= quantity 时扣减并返回 true，否则不变并返回 false
    async fn decrement(&self, key: StockKey, quantity: i64) -> RepoResult<bool>;

    async fn increment(&self, key: StockKey, quantity: i64) -> RepoResult<()>;
}
