//! 订单配置
//!
//! 显式传入策略与下单流水线的配置结构。

use crate::core::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSettings {
    /// 订单号前缀
    pub order_no_prefix: String,
    /// 包邮门槛 (分)，0 表示不设门槛
    pub free_shipping_threshold: i64,
    /// 基础运费 (分)
    pub base_shipping_fee: i64,
}

impl OrderSettings {
    /// 按应付商品金额计算运费
    pub fn shipping_fee_for(&self, amount: i64) -> i64 {
        if self.base_shipping_fee <= 0 {
            return 0;
        }
        if self.free_shipping_threshold > 0 && amount >= self.free_shipping_threshold {
            return 0;
        }
        self.base_shipping_fee
    }

    /// 不收运费的配置 (测试常用)
    pub fn free_shipping() -> Self {
        Self {
            base_shipping_fee: 0,
            ..Self::default()
        }
    }
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            order_no_prefix: "MO".to_string(),
            free_shipping_threshold: 9900,
            base_shipping_fee: 1000,
        }
    }
}

impl From<&Config> for OrderSettings {
    fn from(config: &Config) -> Self {
        Self {
            order_no_prefix: config.order_no_prefix.clone(),
            free_shipping_threshold: config.free_shipping_threshold,
            base_shipping_fee: config.base_shipping_fee,
        }
    }
}
