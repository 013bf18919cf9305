//! Member Coupon Repository

use super::RepoResult;
use async_trait::async_trait;
use shared::models::CouponUser;

#[async_trait]
pub trait CouponRepository: Send + Sync {
    /// 会员名下、指定 ID 且未使用的优惠券 (不存在 / 已使用 / 他人的不会返回)
    async fn find_unused_by_member_and_coupon_ids(
        &self,
        member_id: i64,
        ids: &[i64],
    ) -> RepoResult<Vec<CouponUser>>;

    /// 标记为已使用，仅作用于仍未使用的券，返回实际更新数量
    async fn mark_used(&self, member_id: i64, ids: &[i64], order_id: i64) -> RepoResult<u64>;
}
