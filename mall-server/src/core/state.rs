use std::sync::Arc;

use crate::core::{BackgroundTasks, Clock, Config, SystemClock, TaskKind};
use crate::db::MemoryStore;
use crate::db::repository::{
    CouponRepository, GroupBuyRepository, OrderRepository, ProductRepository, SeckillRepository,
    StockRepository,
};
use crate::group_buy::{DomainGroupBuyLifecycleService, DomainGroupBuyOrderService, GroupBuySweeper};
use crate::orders::strategy::{
    GroupBuyOrderStrategy, NormalOrderStrategy, OrderTypeStrategy, SeckillOrderStrategy,
};
use crate::orders::{OrderService, OrderSettings, OrderTypeStrategyFactory};
use crate::services::refund::{LoggingRefundGateway, RefundGateway};
use crate::stock::OrderStockService;

/// 外部协作方集合
#[derive(Clone)]
pub struct Repositories {
    pub coupons: Arc<dyn CouponRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub stock: Arc<dyn StockRepository>,
    pub group_buys: Arc<dyn GroupBuyRepository>,
    pub seckills: Arc<dyn SeckillRepository>,
    pub refunds: Arc<dyn RefundGateway>,
}

impl Repositories {
    /// 全部由同一个进程内存储提供，退款走日志实现
    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            coupons: store.clone(),
            products: store.clone(),
            orders: store.clone(),
            stock: store.clone(),
            group_buys: store.clone(),
            seckills: store,
            refunds: Arc::new(LoggingRefundGateway::new()),
        }
    }
}

/// 服务器状态 - 持有所有服务的共享引用
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | clock | 时钟 |
/// | stock | 库存服务 (库存计数器唯一写入方) |
/// | factory | 订单类型策略工厂 |
/// | orders | 下单流水线 |
/// | group_buy_orders | 拼团订单领域服务 |
/// | lifecycle | 拼团生命周期 |
///
/// 使用 Arc 实现浅拷贝。
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub repos: Repositories,
    pub stock: Arc<OrderStockService>,
    pub factory: Arc<OrderTypeStrategyFactory>,
    pub orders: Arc<OrderService>,
    pub group_buy_orders: Arc<DomainGroupBuyOrderService>,
    pub lifecycle: Arc<DomainGroupBuyLifecycleService>,
}

impl ServerState {
    /// 装配全部服务
    pub fn build(config: Config, repos: Repositories, clock: Arc<dyn Clock>) -> Self {
        let settings = OrderSettings::from(&config);

        let stock = Arc::new(OrderStockService::new(
            repos.stock.clone(),
            config.stock_lock_timeout(),
        ));
        let group_buy_orders = Arc::new(DomainGroupBuyOrderService::new(
            repos.group_buys.clone(),
            clock.clone(),
        ));
        let lifecycle = Arc::new(DomainGroupBuyLifecycleService::new(
            repos.group_buys.clone(),
            repos.orders.clone(),
            repos.refunds.clone(),
            clock.clone(),
        ));

        let strategies: Vec<Arc<dyn OrderTypeStrategy>> = vec![
            Arc::new(NormalOrderStrategy::new(
                repos.products.clone(),
                repos.coupons.clone(),
                settings.clone(),
            )),
            Arc::new(GroupBuyOrderStrategy::new(
                repos.products.clone(),
                group_buy_orders.clone(),
                settings.clone(),
            )),
            Arc::new(SeckillOrderStrategy::new(
                repos.products.clone(),
                repos.seckills.clone(),
                clock.clone(),
                settings.clone(),
            )),
        ];
        let factory = Arc::new(OrderTypeStrategyFactory::new(strategies));
        tracing::info!(types = ?factory.registered_types(), "Order type strategies registered");

        let orders = Arc::new(OrderService::new(
            factory.clone(),
            stock.clone(),
            repos.orders.clone(),
            group_buy_orders.clone(),
            lifecycle.clone(),
            clock.clone(),
            settings,
        ));

        Self {
            config,
            clock,
            repos,
            stock,
            factory,
            orders,
            group_buy_orders,
            lifecycle,
        }
    }

    /// 基于进程内存储与系统时钟装配
    pub fn in_memory(config: Config) -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = Self::build(
            config,
            Repositories::from_memory(store.clone()),
            Arc::new(SystemClock),
        );
        (state, store)
    }

    /// 注册后台任务
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        let sweeper = GroupBuySweeper::new(
            self.lifecycle.clone(),
            self.config.group_sweep_interval(),
            tasks.shutdown_token(),
        );
        tasks.spawn("group_buy_sweeper", TaskKind::Periodic, sweeper.run());
    }
}
