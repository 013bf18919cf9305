//! 订单基础类型

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Order Status
// ============================================================================

/// 订单状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// 待支付
    #[default]
    Pending,
    /// 已支付
    Paid,
    /// 已发货
    Shipped,
    /// 已完成
    Completed,
    /// 已取消
    Cancelled,
    /// 已退款
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Order Type
// ============================================================================

/// 内置订单类型
///
/// 订单实体上保存的是类型字符串，策略工厂按字符串查找；
/// 这里的枚举只提供内置类型的规范名称。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderType {
    Normal,
    GroupBuy,
    Seckill,
}

impl OrderType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderType::Normal => "normal",
            OrderType::GroupBuy => "group_buy",
            OrderType::Seckill => "seckill",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "normal" => Some(OrderType::Normal),
            "group_buy" => Some(OrderType::GroupBuy),
            "seckill" => Some(OrderType::Seckill),
            _ => None,
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Order Context
// ============================================================================

/// 订单类型相关的上下文
///
/// 取代无类型的扩展字段包，每种活动订单携带自己的强类型字段。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderContext {
    #[default]
    Normal,
    GroupBuy {
        group_buy_id: i64,
        /// 参团时携带；开团时为空
        group_no: Option<String>,
    },
    Seckill {
        seckill_id: i64,
    },
}

// ============================================================================
// Address
// ============================================================================

/// 收货地址快照
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub receiver_name: String,
    pub phone: String,
    pub province: String,
    pub city: String,
    pub district: String,
    pub detail: String,
}
