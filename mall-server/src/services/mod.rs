//! 外部协作服务

pub mod refund;

pub use refund::{LoggingRefundGateway, RefundError, RefundGateway, RefundReceipt};
