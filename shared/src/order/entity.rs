//! 订单实体

use super::price::OrderPriceValue;
use super::types::{Address, OrderContext, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 订单明细行
///
/// 由所属 [`OrderEntity`] 独占持有。数量通过 setter 写入并钳制到 `>= 0`。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItemEntity {
    pub product_id: i64,
    pub sku_id: i64,
    /// 商品名称快照 (下单时由草稿阶段填充)
    #[serde(default)]
    pub product_name: String,
    /// 成交单价 (分)
    #[serde(default)]
    pub unit_price: i64,
    /// 原价 (分)，活动订单用于计算优惠
    #[serde(default)]
    pub original_price: i64,
    quantity: i32,
}

impl OrderItemEntity {
    pub fn new(product_id: i64, sku_id: i64, quantity: i32) -> Self {
        Self {
            product_id,
            sku_id,
            product_name: String::new(),
            unit_price: 0,
            original_price: 0,
            quantity: quantity.max(0),
        }
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn set_quantity(&mut self, quantity: i32) {
        self.quantity = quantity.max(0);
    }

    /// 行小计 (分)
    pub fn total_price(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

/// 订单聚合根
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEntity {
    /// 持久化后回填
    pub id: Option<i64>,
    pub order_no: String,
    pub member_id: i64,
    /// 订单类型字符串 (策略工厂的查找键)
    pub order_type: String,
    pub status: OrderStatus,
    pub price_detail: OrderPriceValue,
    /// 优惠券抵扣金额 (分)
    pub coupon_amount: i64,
    /// 已应用的会员优惠券 ID
    pub coupon_ids: Vec<i64>,
    pub items: Vec<OrderItemEntity>,
    pub address: Option<Address>,
    pub context: OrderContext,
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl OrderEntity {
    pub fn new(
        member_id: i64,
        order_type: impl Into<String>,
        items: Vec<OrderItemEntity>,
        context: OrderContext,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            order_no: String::new(),
            member_id,
            order_type: order_type.into(),
            status: OrderStatus::Pending,
            price_detail: OrderPriceValue::default(),
            coupon_amount: 0,
            coupon_ids: Vec::new(),
            items,
            address: None,
            context,
            remark: None,
            created_at,
            paid_at: None,
        }
    }

    /// 明细行小计之和 (分)
    pub fn items_amount(&self) -> i64 {
        self.items.iter().map(OrderItemEntity::total_price).sum()
    }

    pub fn total_quantity(&self) -> i32 {
        self.items.iter().map(OrderItemEntity::quantity).sum()
    }

    pub fn pay_amount(&self) -> i64 {
        self.price_detail.pay_amount()
    }

    pub fn group_buy_id(&self) -> Option<i64> {
        match &self.context {
            OrderContext::GroupBuy { group_buy_id, .. } => Some(*group_buy_id),
            _ => None,
        }
    }

    pub fn group_no(&self) -> Option<&str> {
        match &self.context {
            OrderContext::GroupBuy { group_no, .. } => group_no.as_deref(),
            _ => None,
        }
    }

    pub fn seckill_id(&self) -> Option<i64> {
        match &self.context {
            OrderContext::Seckill { seckill_id } => Some(*seckill_id),
            _ => None,
        }
    }
}
