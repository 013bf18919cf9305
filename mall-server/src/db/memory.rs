//! 进程内存储
//!
//! 实现全部仓储契约。所有数据在一把 `parking_lot::Mutex` 下，每个方法整体原子执行，
//! 条件更新语义与 `UPDATE ... WHERE status IN (...)` 一致。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::repository::{
    CouponRepository, GroupBuyRepository, OrderRepository, PersistedOrder, ProductRepository,
    RepoError, RepoResult, SeckillRepository, StockKey, StockRepository,
};
use shared::models::{
    CouponStatus, CouponUser, GroupBuyEntity, GroupBuyOrder, GroupBuyOrderStatus, SeckillActivity,
    SkuSnapshot,
};
use shared::order::{OrderEntity, OrderStatus};

#[derive(Debug, Clone)]
struct SeckillPurchase {
    seckill_id: i64,
    member_id: i64,
    order_id: i64,
    quantity: i64,
}

#[derive(Debug, Default)]
struct Inner {
    skus: HashMap<i64, SkuSnapshot>,
    stock: HashMap<StockKey, i64>,
    coupons: BTreeMap<i64, CouponUser>,
    orders: BTreeMap<i64, OrderEntity>,
    next_order_id: i64,
    group_buys: HashMap<i64, GroupBuyEntity>,
    group_buy_orders: Vec<GroupBuyOrder>,
    next_group_buy_order_id: i64,
    seckills: HashMap<i64, SeckillActivity>,
    seckill_purchases: Vec<SeckillPurchase>,
}

impl Inner {
    fn alloc_order_id(&mut self) -> i64 {
        self.next_order_id += 1;
        self.next_order_id
    }

    fn push_group_buy_order(&mut self, mut row: GroupBuyOrder) -> i64 {
        self.next_group_buy_order_id += 1;
        let id = self.next_group_buy_order_id;
        row.id = Some(id);
        self.group_buy_orders.push(row);
        id
    }

    fn group_buy_mut(&mut self, id: i64) -> RepoResult<&mut GroupBuyEntity> {
        self.group_buys
            .get_mut(&id)
            .ok_or_else(|| RepoError::NotFound(format!("group_buy:{}", id)))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Seeding ─────────────────────────────────────────────────

    /// 写入 SKU，同时把 SKU 库存计数器设为快照中的库存
    pub fn insert_sku(&self, sku: SkuSnapshot) {
        let mut inner = self.inner.lock();
        inner.stock.insert(StockKey::Sku(sku.sku_id), sku.stock);
        inner.skus.insert(sku.sku_id, sku);
    }

    pub fn insert_coupon(&self, coupon: CouponUser) {
        self.inner.lock().coupons.insert(coupon.id, coupon);
    }

    pub fn insert_group_buy(&self, activity: GroupBuyEntity) {
        self.inner.lock().group_buys.insert(activity.id, activity);
    }

    /// 写入秒杀活动，同时设置活动库存计数器
    pub fn insert_seckill(&self, activity: SeckillActivity) {
        let mut inner = self.inner.lock();
        inner.stock.insert(StockKey::Seckill(activity.id), activity.stock);
        inner.seckills.insert(activity.id, activity);
    }

    pub fn set_stock(&self, key: StockKey, quantity: i64) {
        self.inner.lock().stock.insert(key, quantity);
    }

    /// 直接写入订单 (未设置 ID 时分配)，返回订单 ID
    pub fn seed_order(&self, mut order: OrderEntity) -> i64 {
        let mut inner = self.inner.lock();
        let id = match order.id {
            Some(id) => {
                inner.next_order_id = inner.next_order_id.max(id);
                id
            }
            None => inner.alloc_order_id(),
        };
        order.id = Some(id);
        if order.order_no.is_empty() {
            order.order_no = format!("MO{:06}", id);
        }
        inner.orders.insert(id, order);
        id
    }

    pub fn insert_group_buy_order(&self, row: GroupBuyOrder) -> i64 {
        self.inner.lock().push_group_buy_order(row)
    }

    pub fn record_seckill_purchase(&self, seckill_id: i64, member_id: i64, order_id: i64, quantity: i64) {
        self.inner.lock().seckill_purchases.push(SeckillPurchase {
            seckill_id,
            member_id,
            order_id,
            quantity,
        });
    }

    // ── Inspection ──────────────────────────────────────────────

    pub fn stock(&self, key: StockKey) -> i64 {
        self.inner.lock().stock.get(&key).copied().unwrap_or(0)
    }

    pub fn order(&self, id: i64) -> Option<OrderEntity> {
        self.inner.lock().orders.get(&id).cloned()
    }

    pub fn orders(&self) -> Vec<OrderEntity> {
        self.inner.lock().orders.values().cloned().collect()
    }

    pub fn coupon(&self, id: i64) -> Option<CouponUser> {
        self.inner.lock().coupons.get(&id).cloned()
    }

    pub fn group_buy(&self, id: i64) -> Option<GroupBuyEntity> {
        self.inner.lock().group_buys.get(&id).cloned()
    }

    /// 团内全部拼团订单行 (写入顺序)
    pub fn group_buy_orders(&self, group_no: &str) -> Vec<GroupBuyOrder> {
        self.inner
            .lock()
            .group_buy_orders
            .iter()
            .filter(|r| r.group_no == group_no)
            .cloned()
            .collect()
    }

    /// 订单对应的拼团订单行
    pub fn group_buy_row(&self, order_id: i64) -> Option<GroupBuyOrder> {
        self.inner
            .lock()
            .group_buy_orders
            .iter()
            .find(|r| r.order_id == order_id)
            .cloned()
    }

    pub fn seckill_purchased(&self, seckill_id: i64, member_id: i64) -> i64 {
        purchased(&self.inner.lock(), seckill_id, member_id)
    }
}

fn purchased(inner: &Inner, seckill_id: i64, member_id: i64) -> i64 {
    inner
        .seckill_purchases
        .iter()
        .filter(|p| p.seckill_id == seckill_id && p.member_id == member_id)
        .map(|p| p.quantity)
        .sum()
}

#[async_trait]
impl CouponRepository for MemoryStore {
    async fn find_unused_by_member_and_coupon_ids(
        &self,
        member_id: i64,
        ids: &[i64],
    ) -> RepoResult<Vec<CouponUser>> {
        let inner = self.inner.lock();
        Ok(ids
            .iter()
            .filter_map(|id| inner.coupons.get(id))
            .filter(|c| c.member_id == member_id && c.status == CouponStatus::Unused)
            .cloned()
            .collect())
    }

    /// 全部仍未使用时才整体更新，否则一张都不动
    async fn mark_used(&self, member_id: i64, ids: &[i64], order_id: i64) -> RepoResult<u64> {
        let mut inner = self.inner.lock();
        let all_unused = ids.iter().all(|id| {
            inner
                .coupons
                .get(id)
                .is_some_and(|c| c.member_id == member_id && c.status == CouponStatus::Unused)
        });
        if !all_unused {
            return Ok(0);
        }
        for id in ids {
            if let Some(c) = inner.coupons.get_mut(id) {
                c.status = CouponStatus::Used;
                c.used_order_id = Some(order_id);
            }
        }
        Ok(ids.len() as u64)
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn find_sku_snapshot(&self, sku_id: i64) -> RepoResult<Option<SkuSnapshot>> {
        let inner = self.inner.lock();
        Ok(inner.skus.get(&sku_id).map(|sku| {
            let mut snapshot = sku.clone();
            snapshot.stock = inner.stock.get(&StockKey::Sku(sku_id)).copied().unwrap_or(0);
            snapshot
        }))
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn save(&self, order: &OrderEntity) -> RepoResult<PersistedOrder> {
        let mut inner = self.inner.lock();
        if !order.order_no.is_empty() && inner.orders.values().any(|o| o.order_no == order.order_no) {
            return Err(RepoError::Duplicate(format!("order_no {}", order.order_no)));
        }
        let id = inner.alloc_order_id();
        let mut stored = order.clone();
        stored.id = Some(id);
        if stored.order_no.is_empty() {
            stored.order_no = format!("MO{:06}", id);
        }
        let order_no = stored.order_no.clone();
        inner.orders.insert(id, stored);
        Ok(PersistedOrder { id, order_no })
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<OrderEntity>> {
        Ok(self.inner.lock().orders.get(&id).cloned())
    }

    async fn mark_paid(&self, id: i64, paid_at: DateTime<Utc>) -> RepoResult<bool> {
        let mut inner = self.inner.lock();
        match inner.orders.get_mut(&id) {
            Some(order) if order.status == OrderStatus::Pending => {
                order.status = OrderStatus::Paid;
                order.paid_at = Some(paid_at);
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(RepoError::NotFound(format!("order:{}", id))),
        }
    }

    async fn update_status(&self, id: i64, from: OrderStatus, to: OrderStatus) -> RepoResult<bool> {
        let mut inner = self.inner.lock();
        match inner.orders.get_mut(&id) {
            Some(order) if order.status == from => {
                order.status = to;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(RepoError::NotFound(format!("order:{}", id))),
        }
    }
}

#[async_trait]
impl StockRepository for MemoryStore {
    async fn available(&self, key: StockKey) -> RepoResult<i64> {
        Ok(self.stock(key))
    }

    async fn decrement(&self, key: StockKey, quantity: i64) -> RepoResult<bool> {
        let mut inner = self.inner.lock();
        let current = inner.stock.entry(key).or_insert(0);
        if *current < quantity {
            return Ok(false);
        }
        *current -= quantity;
        Ok(true)
    }

    async fn increment(&self, key: StockKey, quantity: i64) -> RepoResult<()> {
        *self.inner.lock().stock.entry(key).or_insert(0) += quantity;
        Ok(())
    }
}

#[async_trait]
impl GroupBuyRepository for MemoryStore {
    async fn find_activity(&self, id: i64) -> RepoResult<Option<GroupBuyEntity>> {
        Ok(self.group_buy(id))
    }

    async fn increase_sold_quantity(&self, id: i64, quantity: i64) -> RepoResult<bool> {
        let mut inner = self.inner.lock();
        let activity = inner.group_buy_mut(id)?;
        if activity.sold_quantity + quantity > activity.total_quantity {
            return Ok(false);
        }
        activity.sold_quantity += quantity;
        Ok(true)
    }

    async fn decrease_sold_quantity(&self, id: i64, quantity: i64) -> RepoResult<()> {
        let mut inner = self.inner.lock();
        let activity = inner.group_buy_mut(id)?;
        activity.sold_quantity = (activity.sold_quantity - quantity).max(0);
        Ok(())
    }

    async fn increase_group_count(&self, id: i64) -> RepoResult<()> {
        self.inner.lock().group_buy_mut(id)?.group_count += 1;
        Ok(())
    }

    async fn increase_success_group_count(&self, id: i64) -> RepoResult<()> {
        self.inner.lock().group_buy_mut(id)?.success_group_count += 1;
        Ok(())
    }

    async fn insert_order(&self, row: &GroupBuyOrder) -> RepoResult<i64> {
        let mut inner = self.inner.lock();
        if inner.group_buy_orders.iter().any(|r| r.order_id == row.order_id) {
            return Err(RepoError::Duplicate(format!(
                "group-buy row for order {}",
                row.order_id
            )));
        }
        if row.is_leader
            && inner
                .group_buy_orders
                .iter()
                .any(|r| r.is_leader && r.group_no == row.group_no)
        {
            return Err(RepoError::Duplicate(format!("group_no {}", row.group_no)));
        }
        Ok(inner.push_group_buy_order(row.clone()))
    }

    async fn find_leader_by_group_no(&self, group_no: &str) -> RepoResult<Option<GroupBuyOrder>> {
        Ok(self
            .inner
            .lock()
            .group_buy_orders
            .iter()
            .find(|r| r.is_leader && r.group_no == group_no)
            .cloned())
    }

    async fn find_by_order_id(&self, order_id: i64) -> RepoResult<Option<GroupBuyOrder>> {
        Ok(self.group_buy_row(order_id))
    }

    async fn has_member_joined(&self, group_buy_id: i64, member_id: i64) -> RepoResult<bool> {
        Ok(self.inner.lock().group_buy_orders.iter().any(|r| {
            r.group_buy_id == group_buy_id
                && r.member_id == member_id
                && r.status != GroupBuyOrderStatus::Failed
        }))
    }

    async fn count_paid_orders(&self, group_no: &str) -> RepoResult<i64> {
        Ok(self
            .inner
            .lock()
            .group_buy_orders
            .iter()
            .filter(|r| r.group_no == group_no && r.status == GroupBuyOrderStatus::Paid)
            .count() as i64)
    }

    async fn count_group_members(&self, group_no: &str) -> RepoResult<i64> {
        Ok(self
            .inner
            .lock()
            .group_buy_orders
            .iter()
            .filter(|r| r.group_no == group_no && r.status != GroupBuyOrderStatus::Failed)
            .count() as i64)
    }

    async fn mark_paid(&self, order_id: i64) -> RepoResult<bool> {
        let mut inner = self.inner.lock();
        match inner
            .group_buy_orders
            .iter_mut()
            .find(|r| r.order_id == order_id)
        {
            Some(row) if row.status == GroupBuyOrderStatus::Pending => {
                row.status = GroupBuyOrderStatus::Paid;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(RepoError::NotFound(format!("group-buy row for order {}", order_id))),
        }
    }

    async fn complete_group(&self, group_no: &str, group_time: DateTime<Utc>) -> RepoResult<u64> {
        let mut inner = self.inner.lock();
        let mut flipped = 0;
        for row in inner
            .group_buy_orders
            .iter_mut()
            .filter(|r| r.group_no == group_no && r.status.is_open())
        {
            row.status = GroupBuyOrderStatus::Grouped;
            row.group_time = Some(group_time);
            flipped += 1;
        }
        Ok(flipped)
    }

    async fn fail_group(&self, group_no: &str) -> RepoResult<Vec<GroupBuyOrder>> {
        let mut inner = self.inner.lock();
        let mut prior = Vec::new();
        for row in inner
            .group_buy_orders
            .iter_mut()
            .filter(|r| r.group_no == group_no && r.status.is_open())
        {
            prior.push(row.clone());
            row.status = GroupBuyOrderStatus::Failed;
        }
        Ok(prior)
    }

    async fn find_expired_group_nos(&self, now: DateTime<Utc>) -> RepoResult<Vec<String>> {
        let group_nos: BTreeSet<String> = self
            .inner
            .lock()
            .group_buy_orders
            .iter()
            .filter(|r| r.status.is_open() && r.expire_time < now)
            .map(|r| r.group_no.clone())
            .collect();
        Ok(group_nos.into_iter().collect())
    }
}

#[async_trait]
impl SeckillRepository for MemoryStore {
    async fn find_activity(&self, id: i64) -> RepoResult<Option<SeckillActivity>> {
        Ok(self.inner.lock().seckills.get(&id).cloned())
    }

    async fn purchased_quantity(&self, seckill_id: i64, member_id: i64) -> RepoResult<i64> {
        Ok(self.seckill_purchased(seckill_id, member_id))
    }

    async fn record_purchase(
        &self,
        seckill_id: i64,
        member_id: i64,
        order_id: i64,
        quantity: i64,
    ) -> RepoResult<()> {
        let mut inner = self.inner.lock();
        if inner
            .seckill_purchases
            .iter()
            .any(|p| p.seckill_id == seckill_id && p.order_id == order_id)
        {
            return Err(RepoError::Duplicate(format!(
                "seckill {} purchase for order {}",
                seckill_id, order_id
            )));
        }
        inner.seckill_purchases.push(SeckillPurchase {
            seckill_id,
            member_id,
            order_id,
            quantity,
        });
        Ok(())
    }
}
