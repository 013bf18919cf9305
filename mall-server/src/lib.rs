//! Mall Server - 商城订单与营销活动核心
//!
//! # 架构概述
//!
//! - **下单流水线** (`orders`): 按订单类型选择策略，校验、草稿、锁库存、预占、
//!   优惠券、验价、保存、后置处理
//! - **库存** (`stock`): 库存计数器唯一写入方，按确定顺序加锁
//! - **拼团** (`group_buy`): 开团/参团、成团判定、过期失败与退款、周期扫描
//! - **存储契约** (`db`): 仓储 trait 与进程内实现
//!
//! # 模块结构
//!
//! ```text
//! mall-server/src/
//! ├── core/          # 配置、时钟、后台任务、服务装配
//! ├── db/            # 仓储契约、进程内存储
//! ├── orders/        # 策略、工厂、下单流水线
//! ├── stock/         # 库存锁与预占
//! ├── group_buy/     # 拼团领域服务、生命周期、扫描器
//! ├── services/      # 外部协作 (退款)
//! └── utils/         # 日志
//! ```

pub mod core;
pub mod db;
pub mod group_buy;
pub mod orders;
pub mod services;
pub mod stock;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export 公共类型
pub use crate::core::{BackgroundTasks, Clock, Config, ManualClock, ServerState, SystemClock};
pub use db::MemoryStore;
pub use orders::{
    OrderError, OrderResult, OrderService, SubmitItem, SubmitOrderRequest, SubmitOrderResult,
};
pub use stock::{OrderStockService, StockLine};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 加载 .env 并按配置初始化日志
pub fn setup_environment() -> Config {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    init_logger_with_file(
        Some(&config.log_level),
        Some(config.log_json),
        config.log_dir.as_deref(),
    );
    config
}
