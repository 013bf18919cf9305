//! 普通订单

use async_trait::async_trait;
use std::sync::Arc;

use super::{OrderTypeStrategy, fill_item_snapshots, price_with_shipping, validate_basic};
use crate::db::repository::{CouponRepository, ProductRepository};
use crate::orders::error::{OrderError, OrderResult};
use crate::orders::settings::OrderSettings;
use shared::order::{OrderEntity, OrderType};

pub struct NormalOrderStrategy {
    products: Arc<dyn ProductRepository>,
    coupons: Arc<dyn CouponRepository>,
    settings: OrderSettings,
}

impl NormalOrderStrategy {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        coupons: Arc<dyn CouponRepository>,
        settings: OrderSettings,
    ) -> Self {
        Self {
            products,
            coupons,
            settings,
        }
    }
}

#[async_trait]
impl OrderTypeStrategy for NormalOrderStrategy {
    fn order_type(&self) -> &str {
        OrderType::Normal.as_str()
    }

    async fn validate(&self, order: &OrderEntity) -> OrderResult<()> {
        validate_basic(order)
    }

    async fn build_draft(&self, mut order: OrderEntity) -> OrderResult<OrderEntity> {
        fill_item_snapshots(self.products.as_ref(), &mut order).await?;
        order.price_detail = price_with_shipping(order.items_amount(), 0, &self.settings)?;
        Ok(order)
    }

    /// 按商品金额判断门槛并依次抵扣，抵扣总额不超过应付商品金额
    async fn apply_coupon(&self, order: &mut OrderEntity, coupon_ids: &[i64]) -> OrderResult<()> {
        let mut ids = coupon_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        if ids.is_empty() {
            order.coupon_amount = 0;
            order.coupon_ids.clear();
            return Ok(());
        }

        let coupons = self
            .coupons
            .find_unused_by_member_and_coupon_ids(order.member_id, &ids)
            .await?;

        let goods = order.price_detail.goods_amount();
        let mut remaining = order.price_detail.total_amount();
        let mut deducted = 0;
        for id in &ids {
            let coupon = coupons
                .iter()
                .find(|c| c.id == *id)
                .ok_or(OrderError::CouponUnavailable(*id))?;
            if !coupon.is_applicable(goods) {
                return Err(OrderError::CouponThresholdNotMet(*id));
            }
            let amount = coupon.deduction_for(goods).min(remaining);
            remaining -= amount;
            deducted += amount;
        }

        order.price_detail = order.price_detail.with_extra_discount(deducted)?;
        order.coupon_amount = deducted;
        order.coupon_ids = ids;
        tracing::debug!(member_id = order.member_id, coupon_amount = deducted, "Coupons applied");
        Ok(())
    }

    async fn post_create(&self, order: &OrderEntity) -> OrderResult<()> {
        let Some(&first) = order.coupon_ids.first() else {
            return Ok(());
        };
        let order_id = order
            .id
            .ok_or_else(|| OrderError::Internal("coupon use for unsaved order".to_string()))?;

        let used = self
            .coupons
            .mark_used(order.member_id, &order.coupon_ids, order_id)
            .await?;
        if used as usize != order.coupon_ids.len() {
            return Err(OrderError::CouponUnavailable(first));
        }
        Ok(())
    }
}
