//! 退款触发
//!
//! 外部支付/退款子系统的调用契约：发起并等待受理回执。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use shared::order::OrderEntity;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefundError {
    #[error("Refund rejected: {0}")]
    Rejected(String),

    #[error("Refund service unavailable: {0}")]
    Unavailable(String),
}

/// 退款受理回执
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundReceipt {
    pub order_id: i64,
    pub order_no: String,
    pub amount: i64,
    pub accepted_at: DateTime<Utc>,
}

#[async_trait]
pub trait RefundGateway: Send + Sync {
    async fn trigger_refund(&self, order: &OrderEntity) -> Result<RefundReceipt, RefundError>;
}

/// 默认退款实现：记录日志并直接受理
#[derive(Debug, Default)]
pub struct LoggingRefundGateway {
    receipts: Mutex<Vec<RefundReceipt>>,
}

impl LoggingRefundGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已受理的退款
    pub fn receipts(&self) -> Vec<RefundReceipt> {
        self.receipts.lock().clone()
    }
}

#[async_trait]
impl RefundGateway for LoggingRefundGateway {
    async fn trigger_refund(&self, order: &OrderEntity) -> Result<RefundReceipt, RefundError> {
        let order_id = order
            .id
            .ok_or_else(|| RefundError::Rejected(format!("order {} not persisted", order.order_no)))?;

        let receipt = RefundReceipt {
            order_id,
            order_no: order.order_no.clone(),
            amount: order.pay_amount(),
            accepted_at: Utc::now(),
        };
        tracing::info!(
            order_id,
            order_no = %order.order_no,
            amount = receipt.amount,
            "Refund triggered"
        );
        self.receipts.lock().push(receipt.clone());
        Ok(receipt)
    }
}
