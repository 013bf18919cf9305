use crate::db::repository::{RepoError, StockKey};
use shared::error::{AppError, ErrorCode};
use shared::order::{OrderEntity, OrderStatus, PriceError};
use thiserror::Error;

/// 订单核心错误
///
/// 面向用户的变体 Display 即固定提示文案。
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("{0}")]
    Validation(String),

    #[error("当前拼团活动不可参与")]
    ActivityNotJoinable,

    #[error("该商品不在当前拼团活动中")]
    SkuMismatch,

    #[error("拼团商品库存不足")]
    InsufficientStock,

    #[error("每人每个活动限参一次")]
    DuplicateJoin,

    #[error("商品价格已变动，请重新下单")]
    PriceMismatch { declared: i64, actual: i64 },

    #[error("优惠券{0}不可用或已使用")]
    CouponUnavailable(i64),

    #[error("未达到优惠券使用门槛")]
    CouponThresholdNotMet(i64),

    #[error("活动订单不可叠加优惠券")]
    CouponNotStackable,

    #[error("订单{0}不存在")]
    OrderNotFound(i64),

    #[error("订单商品不能为空")]
    EmptyOrder,

    #[error("订单{0}已支付")]
    AlreadyPaid(String),

    #[error("{0}不存在")]
    GroupBuyNotFound(String),

    #[error("秒杀活动{0}不存在")]
    SeckillNotFound(i64),

    #[error("商品{0}已下架或不存在")]
    ProductUnavailable(i64),

    #[error("商品{0}与SKU不匹配")]
    ProductMismatch(i64),

    #[error("商品库存不足: {0}")]
    OutOfStock(StockKey),

    #[error("商品太火爆了，请稍后再试")]
    StockBusy(StockKey),

    #[error("秒杀活动未开始或已结束")]
    SeckillNotActive,

    #[error("超出秒杀限购数量")]
    SeckillLimitExceeded,

    #[error("不支持的订单类型: {0}")]
    UnknownOrderType(String),

    #[error("订单状态不允许该操作: {0}")]
    InvalidStatus(String),

    #[error(transparent)]
    Price(#[from] PriceError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepoError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OrderError {
    /// 订单当前状态不允许支付
    pub fn not_payable(order: &OrderEntity) -> Self {
        match order.status {
            OrderStatus::Paid => OrderError::AlreadyPaid(order.order_no.clone()),
            status => OrderError::InvalidStatus(format!("订单{}当前状态为{}", order.order_no, status)),
        }
    }

    /// 对应的错误码
    pub fn code(&self) -> ErrorCode {
        match self {
            OrderError::Validation(_) => ErrorCode::ValidationFailed,
            OrderError::ActivityNotJoinable => ErrorCode::GroupBuyNotJoinable,
            OrderError::SkuMismatch => ErrorCode::GroupBuySkuMismatch,
            OrderError::InsufficientStock => ErrorCode::GroupBuyStockInsufficient,
            OrderError::DuplicateJoin => ErrorCode::GroupBuyDuplicateJoin,
            OrderError::PriceMismatch { .. } => ErrorCode::PriceChanged,
            OrderError::CouponUnavailable(_) => ErrorCode::CouponUnavailable,
            OrderError::CouponThresholdNotMet(_) => ErrorCode::CouponThresholdNotMet,
            OrderError::CouponNotStackable => ErrorCode::CouponNotStackable,
            OrderError::OrderNotFound(_) => ErrorCode::OrderNotFound,
            OrderError::EmptyOrder => ErrorCode::OrderEmpty,
            OrderError::AlreadyPaid(_) => ErrorCode::OrderAlreadyPaid,
            OrderError::GroupBuyNotFound(_) => ErrorCode::GroupBuyNotFound,
            OrderError::SeckillNotFound(_) => ErrorCode::SeckillNotFound,
            OrderError::ProductUnavailable(_) => ErrorCode::ProductOffline,
            OrderError::ProductMismatch(_) => ErrorCode::SkuMismatch,
            OrderError::OutOfStock(_) => ErrorCode::ProductOutOfStock,
            OrderError::StockBusy(_) => ErrorCode::StockBusy,
            OrderError::SeckillNotActive => ErrorCode::SeckillNotActive,
            OrderError::SeckillLimitExceeded => ErrorCode::SeckillLimitExceeded,
            OrderError::UnknownOrderType(_) => ErrorCode::OrderTypeUnknown,
            OrderError::InvalidStatus(_) => ErrorCode::OrderStatusInvalid,
            OrderError::Price(_) => ErrorCode::ValidationFailed,
            OrderError::Repository(RepoError::NotFound(_)) => ErrorCode::NotFound,
            OrderError::Repository(RepoError::Duplicate(_)) => ErrorCode::AlreadyExists,
            OrderError::Repository(_) => ErrorCode::DatabaseError,
            OrderError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let code = err.code();
        match &err {
            OrderError::Repository(e) => {
                tracing::error!(error = %e, error_code = ?code, "Repository error occurred");
            }
            OrderError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal order error");
            }
            _ => {}
        }
        let app = AppError::with_message(code, err.to_string());
        match err {
            OrderError::PriceMismatch { declared, actual } => app
                .with_detail("declared", declared)
                .with_detail("actual", actual),
            OrderError::OutOfStock(key) | OrderError::StockBusy(key) => {
                app.with_detail("stock_key", key.to_string())
            }
            OrderError::UnknownOrderType(t) => app.with_detail("order_type", t),
            _ => app,
        }
    }
}

pub type OrderResult<T> = Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_messages() {
        assert_eq!(OrderError::ActivityNotJoinable.to_string(), "当前拼团活动不可参与");
        assert_eq!(OrderError::SkuMismatch.to_string(), "该商品不在当前拼团活动中");
        assert_eq!(OrderError::InsufficientStock.to_string(), "拼团商品库存不足");
        assert_eq!(OrderError::DuplicateJoin.to_string(), "每人每个活动限参一次");
        assert_eq!(
            OrderError::PriceMismatch { declared: 1, actual: 2 }.to_string(),
            "商品价格已变动，请重新下单"
        );
        assert!(OrderError::CouponUnavailable(7).to_string().contains("不可用或已使用"));
    }

    #[test]
    fn test_unknown_type_keeps_type_verbatim() {
        let err = OrderError::UnknownOrderType("pre_sale".to_string());
        assert!(err.to_string().contains("pre_sale"));
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = OrderError::PriceMismatch { declared: 100, actual: 99 }.into();
        assert_eq!(app.code, ErrorCode::PriceChanged);
        assert_eq!(app.message, "商品价格已变动，请重新下单");
        assert!(app.details.is_some());

        let app: AppError = OrderError::StockBusy(StockKey::Sku(3)).into();
        assert_eq!(app.code, ErrorCode::StockBusy);

        let app: AppError = OrderError::Repository(RepoError::Database("down".into())).into();
        assert_eq!(app.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn test_lookup_failures_use_domain_codes() {
        assert_eq!(OrderError::OrderNotFound(9).code(), ErrorCode::OrderNotFound);
        assert_eq!(OrderError::EmptyOrder.code(), ErrorCode::OrderEmpty);
        assert_eq!(
            OrderError::GroupBuyNotFound("拼团GB1".to_string()).code(),
            ErrorCode::GroupBuyNotFound
        );
        assert_eq!(OrderError::SeckillNotFound(5).code(), ErrorCode::SeckillNotFound);
        assert_eq!(OrderError::OrderNotFound(9).to_string(), "订单9不存在");
    }

    #[test]
    fn test_not_payable_distinguishes_paid() {
        let mut order = OrderEntity::new(
            1,
            "normal",
            Vec::new(),
            shared::order::OrderContext::Normal,
            chrono::Utc::now(),
        );
        order.order_no = "NO1".to_string();
        order.status = OrderStatus::Paid;
        let err = OrderError::not_payable(&order);
        assert!(matches!(err, OrderError::AlreadyPaid(_)));
        assert_eq!(err.code(), ErrorCode::OrderAlreadyPaid);

        order.status = OrderStatus::Cancelled;
        assert_eq!(OrderError::not_payable(&order).code(), ErrorCode::OrderStatusInvalid);
    }
}
