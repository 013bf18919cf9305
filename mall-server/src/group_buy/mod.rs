//! 拼团领域
//!
//! - [`DomainGroupBuyOrderService`] - 参团校验、团长/团员订单行创建
//! - [`DomainGroupBuyLifecycleService`] - 成团判定、过期失败与退款
//! - [`GroupBuySweeper`] - 周期性过期扫描

pub mod lifecycle;
pub mod order_service;
pub mod sweeper;

pub use lifecycle::{DomainGroupBuyLifecycleService, ExpiredGroupOutcome};
pub use order_service::DomainGroupBuyOrderService;
pub use sweeper::GroupBuySweeper;
