//! 秒杀订单
//!
//! 除 SKU 库存外还预占秒杀活动库存，两者都经由库存服务加锁扣减。

use async_trait::async_trait;
use std::sync::Arc;

use super::{
    OrderTypeStrategy, fill_item_snapshots, price_with_shipping, reject_coupons, single_item,
    validate_basic,
};
use crate::core::Clock;
use crate::db::repository::{ProductRepository, SeckillRepository, StockKey};
use crate::orders::error::{OrderError, OrderResult};
use crate::orders::settings::OrderSettings;
use crate::stock::StockLine;
use shared::models::SeckillActivity;
use shared::order::{OrderEntity, OrderType};

pub struct SeckillOrderStrategy {
    products: Arc<dyn ProductRepository>,
    seckills: Arc<dyn SeckillRepository>,
    clock: Arc<dyn Clock>,
    settings: OrderSettings,
}

impl SeckillOrderStrategy {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        seckills: Arc<dyn SeckillRepository>,
        clock: Arc<dyn Clock>,
        settings: OrderSettings,
    ) -> Self {
        Self {
            products,
            seckills,
            clock,
            settings,
        }
    }

    async fn load_activity(&self, order: &OrderEntity) -> OrderResult<SeckillActivity> {
        let seckill_id = order
            .seckill_id()
            .ok_or_else(|| OrderError::Validation("秒杀订单缺少活动信息".to_string()))?;
        self.seckills
            .find_activity(seckill_id)
            .await?
            .ok_or(OrderError::SeckillNotFound(seckill_id))
    }

    async fn check_limit(
        &self,
        activity: &SeckillActivity,
        member_id: i64,
        quantity: i64,
    ) -> OrderResult<()> {
        if activity.limit_per_member <= 0 {
            return Ok(());
        }
        let purchased = self.seckills.purchased_quantity(activity.id, member_id).await?;
        if purchased + quantity > activity.limit_per_member {
            return Err(OrderError::SeckillLimitExceeded);
        }
        Ok(())
    }
}

#[async_trait]
impl OrderTypeStrategy for SeckillOrderStrategy {
    fn order_type(&self) -> &str {
        OrderType::Seckill.as_str()
    }

    async fn validate(&self, order: &OrderEntity) -> OrderResult<()> {
        validate_basic(order)?;
        let item = single_item(order)?;
        let activity = self.load_activity(order).await?;

        if !activity.is_running(self.clock.now()) {
            return Err(OrderError::SeckillNotActive);
        }
        if activity.sku_id != item.sku_id {
            return Err(OrderError::Validation("该商品不在当前秒杀活动中".to_string()));
        }
        self.check_limit(&activity, order.member_id, i64::from(item.quantity()))
            .await
    }

    async fn build_draft(&self, mut order: OrderEntity) -> OrderResult<OrderEntity> {
        fill_item_snapshots(self.products.as_ref(), &mut order).await?;
        let activity = self.load_activity(&order).await?;

        let mut goods = 0;
        let mut discount = 0;
        for item in order.items.iter_mut() {
            let quantity = i64::from(item.quantity());
            let original = item.original_price.max(activity.seckill_price);
            item.unit_price = activity.seckill_price;
            item.original_price = original;
            goods += original * quantity;
            discount += (original - activity.seckill_price) * quantity;
        }

        order.price_detail = price_with_shipping(goods, discount, &self.settings)?;
        Ok(order)
    }

    fn stock_lines(&self, order: &OrderEntity) -> Vec<StockLine> {
        let mut lines: Vec<StockLine> = order
            .items
            .iter()
            .map(|item| StockLine::new(StockKey::Sku(item.sku_id), i64::from(item.quantity())))
            .collect();
        if let Some(seckill_id) = order.seckill_id() {
            lines.push(StockLine::new(
                StockKey::Seckill(seckill_id),
                i64::from(order.total_quantity()),
            ));
        }
        lines
    }

    async fn apply_coupon(&self, order: &mut OrderEntity, coupon_ids: &[i64]) -> OrderResult<()> {
        reject_coupons(order, coupon_ids)
    }

    /// 在活动库存锁内复核限购后记录购买
    async fn post_create(&self, order: &OrderEntity) -> OrderResult<()> {
        let order_id = order
            .id
            .ok_or_else(|| OrderError::Internal("seckill purchase for unsaved order".to_string()))?;
        let activity = self.load_activity(order).await?;
        let quantity = i64::from(order.total_quantity());

        self.check_limit(&activity, order.member_id, quantity).await?;
        self.seckills
            .record_purchase(activity.id, order.member_id, order_id, quantity)
            .await?;
        Ok(())
    }
}
