//! Order Repository

use super::RepoResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::order::{OrderEntity, OrderStatus};

/// 持久化结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedOrder {
    pub id: i64,
    pub order_no: String,
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn save(&self, order: &OrderEntity) -> RepoResult<PersistedOrder>;

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<OrderEntity>>;

    /// `pending → paid`，返回是否更新
    async fn mark_paid(&self, id: i64, paid_at: DateTime<Utc>) -> RepoResult<bool>;

    /// 条件状态流转：当前状态为 `from` 时才更新为 `to`
    async fn update_status(&self, id: i64, from: OrderStatus, to: OrderStatus) -> RepoResult<bool>;
}
