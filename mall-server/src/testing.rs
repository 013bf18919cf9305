//! 测试辅助：固定数据、记录调用的仓储替身、整套服务装配

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration as StdDuration;

use crate::core::{Clock, ManualClock};
use crate::db::MemoryStore;
use crate::db::repository::{
    GroupBuyRepository, ProductRepository, RepoResult, StockKey, StockRepository,
};
use crate::group_buy::{DomainGroupBuyLifecycleService, DomainGroupBuyOrderService};
use crate::orders::factory::OrderTypeStrategyFactory;
use crate::orders::service::{OrderService, SubmitItem, SubmitOrderRequest};
use crate::orders::settings::OrderSettings;
use crate::orders::strategy::{
    GroupBuyOrderStrategy, NormalOrderStrategy, OrderTypeStrategy, SeckillOrderStrategy,
};
use crate::services::refund::{LoggingRefundGateway, RefundError, RefundGateway, RefundReceipt};
use crate::stock::OrderStockService;
use shared::models::{
    CouponKind, CouponStatus, CouponUser, GroupBuyActivityStatus, GroupBuyEntity, GroupBuyOrder,
    GroupBuyOrderStatus, ProductStatus, SeckillActivity, SkuSnapshot,
};
use shared::order::{
    Address, OrderContext, OrderEntity, OrderItemEntity, OrderPriceValue, OrderStatus,
};

// ============================================================================
// Fixtures
// ============================================================================

pub fn address() -> Address {
    Address {
        receiver_name: "张三".to_string(),
        phone: "13800000000".to_string(),
        province: "浙江省".to_string(),
        city: "杭州市".to_string(),
        district: "西湖区".to_string(),
        detail: "文三路 1 号".to_string(),
    }
}

pub fn sku(sku_id: i64, product_id: i64, price: i64, stock: i64) -> SkuSnapshot {
    SkuSnapshot {
        product_id,
        sku_id,
        product_name: format!("商品{}", product_id),
        sku_name: Some(format!("规格{}", sku_id)),
        price,
        stock,
        status: ProductStatus::OnSale,
    }
}

fn coupon(id: i64, member_id: i64, kind: CouponKind, value: i64, min_spend: i64) -> CouponUser {
    CouponUser {
        id,
        member_id,
        coupon_id: id * 100,
        title: format!("券{}", id),
        kind,
        value,
        min_spend,
        status: CouponStatus::Unused,
        used_order_id: None,
    }
}

pub fn cash_coupon(id: i64, member_id: i64, value: i64, min_spend: i64) -> CouponUser {
    coupon(id, member_id, CouponKind::Cash, value, min_spend)
}

pub fn percent_coupon(id: i64, member_id: i64, percent: i64, min_spend: i64) -> CouponUser {
    coupon(id, member_id, CouponKind::Percent, percent, min_spend)
}

/// SKU 1000 / 商品 100，原价 10000，拼团价 8000，2~3 人成团，24 小时时限
pub fn group_buy_activity(id: i64, now: DateTime<Utc>) -> GroupBuyEntity {
    GroupBuyEntity {
        id,
        product_id: 100,
        sku_id: 1000,
        title: "两人团".to_string(),
        total_quantity: 100,
        sold_quantity: 0,
        min_people: 2,
        max_people: 3,
        start_time: now - Duration::days(1),
        end_time: now + Duration::days(7),
        group_time_limit: 24,
        status: GroupBuyActivityStatus::Active,
        is_enabled: true,
        original_price: 10_000,
        group_price: 8_000,
        group_count: 0,
        success_group_count: 0,
    }
}

pub fn group_buy_order(
    group_buy_id: i64,
    order_id: i64,
    member_id: i64,
    group_no: &str,
    is_leader: bool,
    now: DateTime<Utc>,
) -> GroupBuyOrder {
    GroupBuyOrder {
        id: None,
        group_buy_id,
        order_id,
        member_id,
        sku_id: 1000,
        quantity: 1,
        is_leader,
        group_no: group_no.to_string(),
        parent_order_id: None,
        share_code: None,
        join_time: now,
        expire_time: now + Duration::hours(24),
        group_time: None,
        status: GroupBuyOrderStatus::Pending,
        original_price: 10_000,
        group_price: 8_000,
        total_amount: 8_000,
    }
}

/// 已保存的拼团订单 (不含 ID)
pub fn saved_order(member_id: i64, status: OrderStatus, now: DateTime<Utc>) -> OrderEntity {
    let mut item = OrderItemEntity::new(100, 1000, 1);
    item.unit_price = 8_000;
    item.original_price = 10_000;
    let mut order = OrderEntity::new(
        member_id,
        "group_buy",
        vec![item],
        OrderContext::GroupBuy {
            group_buy_id: 1,
            group_no: None,
        },
        now,
    );
    order.price_detail = OrderPriceValue::new(10_000, 2_000, 1_000).unwrap();
    order.status = status;
    order.address = Some(address());
    order
}

/// 秒杀价 990，活动库存 10，每人限购 2
pub fn seckill_activity(id: i64, sku_id: i64, now: DateTime<Utc>) -> SeckillActivity {
    SeckillActivity {
        id,
        product_id: 1,
        sku_id,
        title: "整点秒杀".to_string(),
        seckill_price: 990,
        stock: 10,
        limit_per_member: 2,
        start_time: now - Duration::hours(1),
        end_time: now + Duration::days(1),
        is_enabled: true,
    }
}

pub fn request(member_id: i64, order_type: &str, items: &[(i64, i64, i32)], pay_amount: i64) -> SubmitOrderRequest {
    SubmitOrderRequest {
        member_id,
        order_type: order_type.to_string(),
        items: items
            .iter()
            .map(|&(product_id, sku_id, quantity)| SubmitItem {
                product_id,
                sku_id,
                quantity,
            })
            .collect(),
        address: Some(address()),
        coupon_ids: Vec::new(),
        group_buy_id: None,
        group_no: None,
        seckill_id: None,
        pay_amount,
        remark: None,
    }
}

// ============================================================================
// Recording doubles
// ============================================================================

/// 跨仓储共享的调用记录
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.0.lock().iter().position(|e| e.starts_with(prefix))
    }
}

pub struct RecordingProductRepo {
    inner: Arc<MemoryStore>,
    log: EventLog,
}

impl RecordingProductRepo {
    pub fn new(inner: Arc<MemoryStore>, log: EventLog) -> Self {
        Self { inner, log }
    }
}

#[async_trait]
impl ProductRepository for RecordingProductRepo {
    async fn find_sku_snapshot(&self, sku_id: i64) -> RepoResult<Option<SkuSnapshot>> {
        self.log.push(format!("find_sku_snapshot({})", sku_id));
        self.inner.find_sku_snapshot(sku_id).await
    }
}

pub struct RecordingStockRepo {
    inner: Arc<MemoryStore>,
    log: EventLog,
}

impl RecordingStockRepo {
    pub fn new(inner: Arc<MemoryStore>, log: EventLog) -> Self {
        Self { inner, log }
    }
}

#[async_trait]
impl StockRepository for RecordingStockRepo {
    async fn available(&self, key: StockKey) -> RepoResult<i64> {
        self.log.push(format!("available({})", key));
        self.inner.available(key).await
    }

    async fn decrement(&self, key: StockKey, quantity: i64) -> RepoResult<bool> {
        self.log.push(format!("decrement({}, {})", key, quantity));
        self.inner.decrement(key, quantity).await
    }

    async fn increment(&self, key: StockKey, quantity: i64) -> RepoResult<()> {
        self.log.push(format!("increment({}, {})", key, quantity));
        self.inner.increment(key, quantity).await
    }
}

/// 记录拼团聚合计数器调用，其余方法直接委托
pub struct RecordingGroupBuyRepo {
    inner: Arc<MemoryStore>,
    calls: Mutex<Vec<String>>,
}

impl RecordingGroupBuyRepo {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl GroupBuyRepository for RecordingGroupBuyRepo {
    async fn find_activity(&self, id: i64) -> RepoResult<Option<GroupBuyEntity>> {
        GroupBuyRepository::find_activity(self.inner.as_ref(), id).await
    }

    async fn increase_sold_quantity(&self, id: i64, quantity: i64) -> RepoResult<bool> {
        self.calls
            .lock()
            .push(format!("increase_sold_quantity({}, {})", id, quantity));
        self.inner.increase_sold_quantity(id, quantity).await
    }

    async fn decrease_sold_quantity(&self, id: i64, quantity: i64) -> RepoResult<()> {
        self.calls
            .lock()
            .push(format!("decrease_sold_quantity({}, {})", id, quantity));
        self.inner.decrease_sold_quantity(id, quantity).await
    }

    async fn increase_group_count(&self, id: i64) -> RepoResult<()> {
        self.calls.lock().push(format!("increase_group_count({})", id));
        self.inner.increase_group_count(id).await
    }

    async fn increase_success_group_count(&self, id: i64) -> RepoResult<()> {
        self.calls
            .lock()
            .push(format!("increase_success_group_count({})", id));
        self.inner.increase_success_group_count(id).await
    }

    async fn insert_order(&self, row: &GroupBuyOrder) -> RepoResult<i64> {
        self.inner.insert_order(row).await
    }

    async fn find_leader_by_group_no(&self, group_no: &str) -> RepoResult<Option<GroupBuyOrder>> {
        self.inner.find_leader_by_group_no(group_no).await
    }

    async fn find_by_order_id(&self, order_id: i64) -> RepoResult<Option<GroupBuyOrder>> {
        self.inner.find_by_order_id(order_id).await
    }

    async fn has_member_joined(&self, group_buy_id: i64, member_id: i64) -> RepoResult<bool> {
        self.inner.has_member_joined(group_buy_id, member_id).await
    }

    async fn count_paid_orders(&self, group_no: &str) -> RepoResult<i64> {
        self.inner.count_paid_orders(group_no).await
    }

    async fn count_group_members(&self, group_no: &str) -> RepoResult<i64> {
        self.inner.count_group_members(group_no).await
    }

    async fn mark_paid(&self, order_id: i64) -> RepoResult<bool> {
        GroupBuyRepository::mark_paid(self.inner.as_ref(), order_id).await
    }

    async fn complete_group(&self, group_no: &str, group_time: DateTime<Utc>) -> RepoResult<u64> {
        self.inner.complete_group(group_no, group_time).await
    }

    async fn fail_group(&self, group_no: &str) -> RepoResult<Vec<GroupBuyOrder>> {
        self.inner.fail_group(group_no).await
    }

    async fn find_expired_group_nos(&self, now: DateTime<Utc>) -> RepoResult<Vec<String>> {
        self.inner.find_expired_group_nos(now).await
    }
}

/// 对指定订单拒绝退款，其余委托给 [`LoggingRefundGateway`]
pub struct FailingRefundGateway {
    failing: Vec<i64>,
    attempts: AtomicUsize,
    inner: LoggingRefundGateway,
}

impl FailingRefundGateway {
    pub fn failing_for(order_ids: Vec<i64>) -> Self {
        Self {
            failing: order_ids,
            attempts: AtomicUsize::new(0),
            inner: LoggingRefundGateway::new(),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RefundGateway for FailingRefundGateway {
    async fn trigger_refund(&self, order: &OrderEntity) -> Result<RefundReceipt, RefundError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if order.id.is_some_and(|id| self.failing.contains(&id)) {
            return Err(RefundError::Unavailable("gateway timeout".to_string()));
        }
        self.inner.trigger_refund(order).await
    }
}

// ============================================================================
// Harness
// ============================================================================

/// 基于 [`MemoryStore`] 的整套下单服务
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub stock: Arc<OrderStockService>,
    pub refunds: Arc<LoggingRefundGateway>,
    pub lifecycle: Arc<DomainGroupBuyLifecycleService>,
    pub service: OrderService,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::build(store.clone(), store.clone(), store, Vec::new())
    }

    /// `extra` 在内置策略之后注册，可覆盖同类型策略
    pub fn build(
        store: Arc<MemoryStore>,
        products: Arc<dyn ProductRepository>,
        stock_repo: Arc<dyn StockRepository>,
        extra: Vec<Arc<dyn OrderTypeStrategy>>,
    ) -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 15, 10, 0, 0).unwrap(),
        ));
        let settings = OrderSettings::default();
        let stock = Arc::new(OrderStockService::new(stock_repo, StdDuration::from_millis(500)));
        let refunds = Arc::new(LoggingRefundGateway::new());

        let group_buys = Arc::new(DomainGroupBuyOrderService::new(store.clone(), clock.clone()));
        let lifecycle = Arc::new(DomainGroupBuyLifecycleService::new(
            store.clone(),
            store.clone(),
            refunds.clone(),
            clock.clone(),
        ));

        let mut strategies: Vec<Arc<dyn OrderTypeStrategy>> = vec![
            Arc::new(NormalOrderStrategy::new(
                products.clone(),
                store.clone(),
                settings.clone(),
            )),
            Arc::new(GroupBuyOrderStrategy::new(
                products.clone(),
                group_buys.clone(),
                settings.clone(),
            )),
            Arc::new(SeckillOrderStrategy::new(
                products,
                store.clone(),
                clock.clone(),
                settings.clone(),
            )),
        ];
        strategies.extend(extra);

        let service = OrderService::new(
            Arc::new(OrderTypeStrategyFactory::new(strategies)),
            stock.clone(),
            store.clone(),
            group_buys,
            lifecycle.clone(),
            clock.clone(),
            settings,
        );

        Self {
            store,
            clock,
            stock,
            refunds,
            lifecycle,
            service,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
