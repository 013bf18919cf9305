//! Group-buy Repository
//!
//! Activity aggregate counters plus the group-buy order rows.

use super::RepoResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{GroupBuyEntity, GroupBuyOrder};

#[async_trait]
pub trait GroupBuyRepository: Send + Sync {
    // ── Activity aggregate ──────────────────────────────────────

    async fn find_activity(&self, id: i64) -> RepoResult<Option<GroupBuyEntity>>;

    /// `sold_quantity + quantity <= total_quantity` 时累加，返回是否更新
    async fn increase_sold_quantity(&self, id: i64, quantity: i64) -> RepoResult<bool>;

    /// 归还已占用的名额，不低于 0
    async fn decrease_sold_quantity(&self, id: i64, quantity: i64) -> RepoResult<()>;

    async fn increase_group_count(&self, id: i64) -> RepoResult<()>;

    async fn increase_success_group_count(&self, id: i64) -> RepoResult<()>;

    // ── Group-buy order rows ────────────────────────────────────

    /// 返回新行 ID
    async fn insert_order(&self, row: &GroupBuyOrder) -> RepoResult<i64>;

    async fn find_leader_by_group_no(&self, group_no: &str) -> RepoResult<Option<GroupBuyOrder>>;

    async fn find_by_order_id(&self, order_id: i64) -> RepoResult<Option<GroupBuyOrder>>;

    /// 会员在该活动中是否有未失败的拼团订单
    async fn has_member_joined(&self, group_buy_id: i64, member_id: i64) -> RepoResult<bool>;

    async fn count_paid_orders(&self, group_no: &str) -> RepoResult<i64>;

    /// 团内未失败的参与人数
    async fn count_group_members(&self, group_no: &str) -> RepoResult<i64>;

    /// `pending → paid`，返回是否更新
    async fn mark_paid(&self, order_id: i64) -> RepoResult<bool>;

    /// 团内所有 pending/paid 行 → grouped 并写入成团时间，返回更新行数
    async fn complete_group(&self, group_no: &str, group_time: DateTime<Utc>) -> RepoResult<u64>;

    /// 团内所有 pending/paid 行 → failed；返回被更新的行 (保留更新前状态)
    async fn fail_group(&self, group_no: &str) -> RepoResult<Vec<GroupBuyOrder>>;

    /// 仍有 pending/paid 行且 `expire_time < now` 的团号
    async fn find_expired_group_nos(&self, now: DateTime<Utc>) -> RepoResult<Vec<String>>;
}
