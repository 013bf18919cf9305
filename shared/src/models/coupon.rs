//! Member coupon model

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// 优惠券类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    /// 立减: `value` 为抵扣金额 (分)
    Cash,
    /// 折扣: `value` 为减免百分比 (15 = 减 15%)
    Percent,
}

/// 会员优惠券状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CouponStatus {
    Unused,
    Used,
    Expired,
}

/// 会员持有的优惠券
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CouponUser {
    pub id: i64,
    pub member_id: i64,
    pub coupon_id: i64,
    pub title: String,
    pub kind: CouponKind,
    pub value: i64,
    /// 使用门槛 (分)，0 表示无门槛
    pub min_spend: i64,
    pub status: CouponStatus,
    pub used_order_id: Option<i64>,
}

impl CouponUser {
    /// 商品金额是否达到门槛
    pub fn is_applicable(&self, goods_amount: i64) -> bool {
        goods_amount >= self.min_spend
    }

    /// 对给定商品金额的抵扣额 (分)，不超过商品金额
    pub fn deduction_for(&self, goods_amount: i64) -> i64 {
        let raw = match self.kind {
            CouponKind::Cash => self.value,
            CouponKind::Percent => {
                let rate = Decimal::from(self.value.clamp(0, 100)) / Decimal::ONE_HUNDRED;
                (Decimal::from(goods_amount) * rate)
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                    .to_i64()
                    .unwrap_or(0)
            }
        };
        raw.clamp(0, goods_amount.max(0))
    }
}
