//! 拼团订单

use async_trait::async_trait;
use std::sync::Arc;

use super::{
    OrderTypeStrategy, fill_item_snapshots, price_with_shipping, reject_coupons, single_item,
    validate_basic,
};
use crate::db::repository::ProductRepository;
use crate::group_buy::DomainGroupBuyOrderService;
use crate::orders::error::{OrderError, OrderResult};
use crate::orders::settings::OrderSettings;
use shared::order::{OrderContext, OrderEntity, OrderType, PriceVo};

pub struct GroupBuyOrderStrategy {
    products: Arc<dyn ProductRepository>,
    group_buys: Arc<DomainGroupBuyOrderService>,
    settings: OrderSettings,
}

impl GroupBuyOrderStrategy {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        group_buys: Arc<DomainGroupBuyOrderService>,
        settings: OrderSettings,
    ) -> Self {
        Self {
            products,
            group_buys,
            settings,
        }
    }

    fn group_buy_id(order: &OrderEntity) -> OrderResult<i64> {
        match &order.context {
            OrderContext::GroupBuy { group_buy_id, .. } => Ok(*group_buy_id),
            _ => Err(OrderError::Validation("拼团订单缺少活动信息".to_string())),
        }
    }
}

#[async_trait]
impl OrderTypeStrategy for GroupBuyOrderStrategy {
    fn order_type(&self) -> &str {
        OrderType::GroupBuy.as_str()
    }

    async fn validate(&self, order: &OrderEntity) -> OrderResult<()> {
        validate_basic(order)?;
        let group_buy_id = Self::group_buy_id(order)?;
        let item = single_item(order)?;

        self.group_buys
            .validate_activity(
                group_buy_id,
                item.sku_id,
                i64::from(item.quantity()),
                order.member_id,
                order.group_no(),
            )
            .await?;
        Ok(())
    }

    /// 单价取拼团价；商品金额按原价计，差额计入优惠
    async fn build_draft(&self, mut order: OrderEntity) -> OrderResult<OrderEntity> {
        let group_buy_id = Self::group_buy_id(&order)?;
        fill_item_snapshots(self.products.as_ref(), &mut order).await?;

        let activity = self.group_buys.load_activity(group_buy_id).await?;
        let price = PriceVo::new(activity.original_price, activity.group_price)?;

        let mut goods = 0;
        let mut discount = 0;
        for item in order.items.iter_mut() {
            let quantity = i64::from(item.quantity());
            item.unit_price = price.group_price();
            item.original_price = price.original_price();
            goods += price.original_price() * quantity;
            discount += price.discount_amount() * quantity;
        }

        order.price_detail = price_with_shipping(goods, discount, &self.settings)?;
        tracing::debug!(
            group_buy_id,
            discount_rate = %price.discount_rate(),
            "Group-buy draft built"
        );
        Ok(order)
    }

    async fn apply_coupon(&self, order: &mut OrderEntity, coupon_ids: &[i64]) -> OrderResult<()> {
        reject_coupons(order, coupon_ids)
    }

    async fn post_create(&self, order: &OrderEntity) -> OrderResult<()> {
        let activity = self.group_buys.load_activity(Self::group_buy_id(order)?).await?;
        self.group_buys.create_group_buy_order(order, &activity).await?;
        Ok(())
    }
}
