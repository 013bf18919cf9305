//! 订单类型策略
//!
//! 每种订单类型 (普通 / 拼团 / 秒杀) 实现 [`OrderTypeStrategy`]，由下单流水线按
//! 固定顺序调用：
//!
//! ```text
//! validate → build_draft → (加锁/预占) → apply_coupon → adjust_price → (验价/保存) → post_create
//! ```
//!
//! `build_draft` 在任何库存变动之前执行，商品下架或不匹配必须在这里失败。

use async_trait::async_trait;

use crate::db::repository::{ProductRepository, StockKey};
use crate::orders::error::{OrderError, OrderResult};
use crate::orders::settings::OrderSettings;
use crate::stock::StockLine;
use shared::order::{OrderEntity, OrderPriceValue};

mod group_buy;
mod normal;
mod seckill;

pub use group_buy::GroupBuyOrderStrategy;
pub use normal::NormalOrderStrategy;
pub use seckill::SeckillOrderStrategy;

#[async_trait]
pub trait OrderTypeStrategy: Send + Sync {
    /// 订单类型标识 (工厂查找键)
    fn order_type(&self) -> &str;

    async fn validate(&self, order: &OrderEntity) -> OrderResult<()>;

    /// 读取实时商品快照，填充明细价格与价格明细
    async fn build_draft(&self, order: OrderEntity) -> OrderResult<OrderEntity>;

    /// 需要预占的库存，默认每个明细行对应一个 SKU 计数器
    fn stock_lines(&self, order: &OrderEntity) -> Vec<StockLine> {
        order
            .items
            .iter()
            .map(|item| StockLine::new(StockKey::Sku(item.sku_id), i64::from(item.quantity())))
            .collect()
    }

    async fn apply_coupon(&self, order: &mut OrderEntity, coupon_ids: &[i64]) -> OrderResult<()>;

    async fn adjust_price(&self, _order: &mut OrderEntity) -> OrderResult<()> {
        Ok(())
    }

    /// 订单保存后的副作用
    async fn post_create(&self, order: &OrderEntity) -> OrderResult<()>;
}

/// 各类型共用的基础校验
pub fn validate_basic(order: &OrderEntity) -> OrderResult<()> {
    if order.member_id <= 0 {
        return Err(OrderError::Validation("会员信息无效".to_string()));
    }
    if order.items.is_empty() {
        return Err(OrderError::EmptyOrder);
    }
    if order.items.iter().any(|item| item.quantity() <= 0) {
        return Err(OrderError::Validation("商品数量必须大于 0".to_string()));
    }
    if order.address.is_none() {
        return Err(OrderError::Validation("收货地址不能为空".to_string()));
    }
    Ok(())
}

/// 活动订单只允许单个商品
pub(crate) fn single_item(order: &OrderEntity) -> OrderResult<&shared::order::OrderItemEntity> {
    match order.items.as_slice() {
        [item] => Ok(item),
        _ => Err(OrderError::Validation("活动订单仅支持单个商品".to_string())),
    }
}

/// 用实时 SKU 快照填充明细行 (名称、单价、原价)
///
/// SKU 不存在或已下架 → `ProductUnavailable`；SKU 不属于所声明的商品 → `ProductMismatch`。
pub async fn fill_item_snapshots(
    products: &dyn ProductRepository,
    order: &mut OrderEntity,
) -> OrderResult<()> {
    for item in order.items.iter_mut() {
        let snapshot = products
            .find_sku_snapshot(item.sku_id)
            .await?
            .filter(|s| s.is_on_sale())
            .ok_or(OrderError::ProductUnavailable(item.sku_id))?;

        if snapshot.product_id != item.product_id {
            return Err(OrderError::ProductMismatch(item.sku_id));
        }

        item.product_name = snapshot.product_name;
        item.unit_price = snapshot.price;
        item.original_price = snapshot.price;
    }
    Ok(())
}

/// 商品金额与优惠确定后，按配置补上运费
pub(crate) fn price_with_shipping(
    goods_amount: i64,
    discount_amount: i64,
    settings: &OrderSettings,
) -> OrderResult<OrderPriceValue> {
    let price = OrderPriceValue::new(goods_amount, discount_amount, 0)?;
    let fee = settings.shipping_fee_for(price.total_amount());
    Ok(price.with_shipping_fee(fee)?)
}

/// 活动订单不叠加优惠券
pub(crate) fn reject_coupons(order: &mut OrderEntity, coupon_ids: &[i64]) -> OrderResult<()> {
    if !coupon_ids.is_empty() {
        return Err(OrderError::CouponNotStackable);
    }
    order.coupon_amount = 0;
    order.coupon_ids.clear();
    Ok(())
}
