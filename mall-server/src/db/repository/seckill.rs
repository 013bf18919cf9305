//! Seckill Repository

use super::RepoResult;
use async_trait::async_trait;
use shared::models::SeckillActivity;

#[async_trait]
pub trait SeckillRepository: Send + Sync {
    async fn find_activity(&self, id: i64) -> RepoResult<Option<SeckillActivity>>;

    /// 会员在该活动中已购数量
    async fn purchased_quantity(&self, seckill_id: i64, member_id: i64) -> RepoResult<i64>;

    async fn record_purchase(
        &self,
        seckill_id: i64,
        member_id: i64,
        order_id: i64,
        quantity: i64,
    ) -> RepoResult<()>;
}
