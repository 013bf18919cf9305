//! 金额值对象
//!
//! 所有金额字段均为整数分 (i64)，不使用浮点数。
//! 比率类派生值 (折扣率) 通过 `rust_decimal` 计算并按半入 (half-up) 保留两位小数。

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rounding for percentage values (2 decimal places, half-up)
const RATE_DECIMAL_PLACES: u32 = 2;

/// 值对象构造失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("拼团价必须大于 0")]
    NonPositiveGroupPrice(i64),

    #[error("拼团价必须低于原价 (原价 {original}, 拼团价 {group})")]
    NotDiscounted { original: i64, group: i64 },

    #[error("金额不能为负数: {field} = {value}")]
    Negative { field: &'static str, value: i64 },

    #[error("优惠金额 {discount} 超过商品金额 {goods}")]
    DiscountExceedsGoods { goods: i64, discount: i64 },
}

// ============================================================================
// PriceVo
// ============================================================================

/// 拼团价格对 (原价 / 拼团价)
///
/// 不变式 `original_price > group_price > 0` 在构造时强制校验，
/// 非法组合无法得到实例。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceVo {
    original_price: i64,
    group_price: i64,
}

impl PriceVo {
    pub fn new(original_price: i64, group_price: i64) -> Result<Self, PriceError> {
        if group_price <= 0 {
            return Err(PriceError::NonPositiveGroupPrice(group_price));
        }
        if group_price >= original_price {
            return Err(PriceError::NotDiscounted {
                original: original_price,
                group: group_price,
            });
        }
        Ok(Self {
            original_price,
            group_price,
        })
    }

    pub fn original_price(&self) -> i64 {
        self.original_price
    }

    pub fn group_price(&self) -> i64 {
        self.group_price
    }

    /// 单件优惠金额 (精确整数减法)
    pub fn discount_amount(&self) -> i64 {
        self.original_price - self.group_price
    }

    /// 折扣率 = round(group / original * 100, 2)
    pub fn discount_rate(&self) -> Decimal {
        (Decimal::from(self.group_price) * Decimal::ONE_HUNDRED / Decimal::from(self.original_price))
            .round_dp_with_strategy(RATE_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
    }
}

// ============================================================================
// OrderPriceValue
// ============================================================================

/// 订单价格明细
///
/// - `total_amount = goods_amount - discount_amount`
/// - `pay_amount = total_amount + shipping_fee`
///
/// 派生字段不存储，始终由三个基础字段计算，因此不变式无法被破坏。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOrderPrice")]
pub struct OrderPriceValue {
    goods_amount: i64,
    discount_amount: i64,
    shipping_fee: i64,
}

#[derive(Deserialize)]
struct RawOrderPrice {
    goods_amount: i64,
    discount_amount: i64,
    shipping_fee: i64,
}

impl TryFrom<RawOrderPrice> for OrderPriceValue {
    type Error = PriceError;

    fn try_from(raw: RawOrderPrice) -> Result<Self, Self::Error> {
        Self::new(raw.goods_amount, raw.discount_amount, raw.shipping_fee)
    }
}

impl OrderPriceValue {
    pub fn new(goods_amount: i64, discount_amount: i64, shipping_fee: i64) -> Result<Self, PriceError> {
        for (field, value) in [
            ("goods_amount", goods_amount),
            ("discount_amount", discount_amount),
            ("shipping_fee", shipping_fee),
        ] {
            if value < 0 {
                return Err(PriceError::Negative { field, value });
            }
        }
        if discount_amount > goods_amount {
            return Err(PriceError::DiscountExceedsGoods {
                goods: goods_amount,
                discount: discount_amount,
            });
        }
        Ok(Self {
            goods_amount,
            discount_amount,
            shipping_fee,
        })
    }

    pub fn goods_amount(&self) -> i64 {
        self.goods_amount
    }

    pub fn discount_amount(&self) -> i64 {
        self.discount_amount
    }

    pub fn shipping_fee(&self) -> i64 {
        self.shipping_fee
    }

    pub fn total_amount(&self) -> i64 {
        self.goods_amount - self.discount_amount
    }

    pub fn pay_amount(&self) -> i64 {
        self.total_amount() + self.shipping_fee
    }

    /// 追加优惠 (例如优惠券抵扣)，返回新值
    pub fn with_extra_discount(&self, amount: i64) -> Result<Self, PriceError> {
        Self::new(
            self.goods_amount,
            self.discount_amount + amount,
            self.shipping_fee,
        )
    }

    /// 替换运费，返回新值
    pub fn with_shipping_fee(&self, shipping_fee: i64) -> Result<Self, PriceError> {
        Self::new(self.goods_amount, self.discount_amount, shipping_fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_vo_discount_amount_is_exact() {
        let vo = PriceVo::new(12_999, 9_999).unwrap();
        assert_eq!(vo.discount_amount(), 3_000);
        assert_eq!(vo.original_price(), 12_999);
        assert_eq!(vo.group_price(), 9_999);
    }

    #[test]
    fn test_price_vo_discount_rate_rounding() {
        // 100 / 120 = 83.333.. -> 83.33
        let vo = PriceVo::new(120, 100).unwrap();
        assert_eq!(vo.discount_rate(), Decimal::new(8333, 2));

        // 2 / 3 = 66.666.. -> 66.67
        let vo = PriceVo::new(3, 2).unwrap();
        assert_eq!(vo.discount_rate(), Decimal::new(6667, 2));

        // 1 / 8 = 12.5 exactly
        let vo = PriceVo::new(800, 100).unwrap();
        assert_eq!(vo.discount_rate(), Decimal::new(1250, 2));
    }

    #[test]
    fn test_price_vo_half_up_not_bankers() {
        // 1 / 16 * 100 = 6.25 ; 1 / 32 * 100 = 3.125 -> 3.13 (banker's would give 3.12)
        let vo = PriceVo::new(3200, 100).unwrap();
        assert_eq!(vo.discount_rate(), Decimal::new(313, 2));
    }

    #[test]
    fn test_price_vo_rejects_invalid_pairs() {
        assert_eq!(
            PriceVo::new(100, 100),
            Err(PriceError::NotDiscounted {
                original: 100,
                group: 100
            })
        );
        assert!(PriceVo::new(100, 150).is_err());
        assert_eq!(
            PriceVo::new(100, 0),
            Err(PriceError::NonPositiveGroupPrice(0))
        );
        assert!(PriceVo::new(100, -5).is_err());
    }

    #[test]
    fn test_price_vo_exhaustive_small_range() {
        for original in 1..60_i64 {
            for group in -2..70_i64 {
                let result = PriceVo::new(original, group);
                if original > group && group > 0 {
                    let vo = result.unwrap();
                    assert_eq!(vo.discount_amount(), original - group);
                    let expected = (Decimal::from(group) * Decimal::ONE_HUNDRED
                        / Decimal::from(original))
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
                    assert_eq!(vo.discount_rate(), expected);
                } else {
                    assert!(result.is_err(), "({original}, {group}) must be rejected");
                }
            }
        }
    }

    #[test]
    fn test_order_price_derived_fields() {
        let price = OrderPriceValue::new(10_000, 1_500, 800).unwrap();
        assert_eq!(price.total_amount(), 8_500);
        assert_eq!(price.pay_amount(), 9_300);

        let with_coupon = price.with_extra_discount(500).unwrap();
        assert_eq!(with_coupon.discount_amount(), 2_000);
        assert_eq!(with_coupon.pay_amount(), 8_800);
        // 原值不变
        assert_eq!(price.discount_amount(), 1_500);
    }

    #[test]
    fn test_order_price_rejects_invalid() {
        assert!(OrderPriceValue::new(-1, 0, 0).is_err());
        assert!(OrderPriceValue::new(100, 0, -1).is_err());
        assert_eq!(
            OrderPriceValue::new(100, 101, 0),
            Err(PriceError::DiscountExceedsGoods {
                goods: 100,
                discount: 101
            })
        );
    }

    #[test]
    fn test_order_price_deserialize_validates() {
        let ok: OrderPriceValue =
            serde_json::from_str(r#"{"goods_amount":500,"discount_amount":100,"shipping_fee":0}"#)
                .unwrap();
        assert_eq!(ok.pay_amount(), 400);

        let bad: Result<OrderPriceValue, _> =
            serde_json::from_str(r#"{"goods_amount":50,"discount_amount":100,"shipping_fee":0}"#);
        assert!(bad.is_err());
    }
}
