//! 订单核心
//!
//! - [`OrderService`] - 下单流水线与支付回调
//! - [`OrderTypeStrategyFactory`] - 订单类型 → 策略
//! - [`strategy`] - 普通 / 拼团 / 秒杀策略
//! - [`OrderSettings`] - 运费与订单号配置

pub mod error;
pub mod factory;
pub mod service;
pub mod settings;
pub mod strategy;

pub use error::{OrderError, OrderResult};
pub use factory::OrderTypeStrategyFactory;
pub use service::{OrderService, SubmitItem, SubmitOrderRequest, SubmitOrderResult, SubmitStage};
pub use settings::OrderSettings;
pub use strategy::OrderTypeStrategy;
