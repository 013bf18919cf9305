//! 下单流水线
//!
//! ```text
//! Validating → BuildingDraft → LockingStock → ReservingStock → ApplyingCoupon
//!   → AdjustingPrice → VerifyingPrice → Persisting → PostCreate → Done
//! ```
//!
//! 任一步失败进入 `Failed`。加锁之后的失败先补回已预占库存，锁在所有退出路径释放；
//! 订单保存后 `post_create` 失败时订单置为已取消。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use super::error::{OrderError, OrderResult};
use super::factory::OrderTypeStrategyFactory;
use super::settings::OrderSettings;
use super::strategy::OrderTypeStrategy;
use crate::core::Clock;
use crate::db::repository::{OrderRepository, PersistedOrder, RepoError};
use crate::group_buy::{DomainGroupBuyLifecycleService, DomainGroupBuyOrderService};
use crate::stock::{OrderStockService, StockLine, StockLockGuard};
use shared::order::{Address, OrderContext, OrderEntity, OrderItemEntity, OrderStatus, OrderType};
use shared::util::generate_order_no;

const ORDER_NO_ATTEMPTS: usize = 3;

/// 下单明细
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitItem {
    pub product_id: i64,
    pub sku_id: i64,
    pub quantity: i32,
}

/// 下单请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOrderRequest {
    pub member_id: i64,
    pub order_type: String,
    pub items: Vec<SubmitItem>,
    pub address: Option<Address>,
    #[serde(default)]
    pub coupon_ids: Vec<i64>,
    pub group_buy_id: Option<i64>,
    /// 参团时携带
    pub group_no: Option<String>,
    pub seckill_id: Option<i64>,
    /// 前端展示的应付金额 (分)
    pub pay_amount: i64,
    pub remark: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitOrderResult {
    pub order_id: i64,
    pub order_no: String,
    pub pay_amount: i64,
    pub order: OrderEntity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStage {
    Validating,
    BuildingDraft,
    LockingStock,
    ReservingStock,
    ApplyingCoupon,
    AdjustingPrice,
    VerifyingPrice,
    Persisting,
    PostCreate,
    Done,
    Failed,
}

impl fmt::Display for SubmitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub struct OrderService {
    factory: Arc<OrderTypeStrategyFactory>,
    stock: Arc<OrderStockService>,
    orders: Arc<dyn OrderRepository>,
    group_buys: Arc<DomainGroupBuyOrderService>,
    lifecycle: Arc<DomainGroupBuyLifecycleService>,
    clock: Arc<dyn Clock>,
    settings: OrderSettings,
}

impl OrderService {
    pub fn new(
        factory: Arc<OrderTypeStrategyFactory>,
        stock: Arc<OrderStockService>,
        orders: Arc<dyn OrderRepository>,
        group_buys: Arc<DomainGroupBuyOrderService>,
        lifecycle: Arc<DomainGroupBuyLifecycleService>,
        clock: Arc<dyn Clock>,
        settings: OrderSettings,
    ) -> Self {
        Self {
            factory,
            stock,
            orders,
            group_buys,
            lifecycle,
            clock,
            settings,
        }
    }

    /// 提交订单
    pub async fn submit(&self, request: SubmitOrderRequest) -> OrderResult<SubmitOrderResult> {
        let submission_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "submit_order",
            %submission_id,
            member_id = request.member_id,
            order_type = %request.order_type
        );

        async move {
            let mut stage = SubmitStage::Validating;
            match self.run(request, &mut stage).await {
                Ok(result) => {
                    advance(&mut stage, SubmitStage::Done);
                    tracing::info!(
                        order_id = result.order_id,
                        order_no = %result.order_no,
                        pay_amount = result.pay_amount,
                        "Order submitted"
                    );
                    Ok(result)
                }
                Err(e) => {
                    let failed_at = stage;
                    advance(&mut stage, SubmitStage::Failed);
                    tracing::warn!(stage = %failed_at, error = %e, "Order submission failed");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        request: SubmitOrderRequest,
        stage: &mut SubmitStage,
    ) -> OrderResult<SubmitOrderResult> {
        let strategy = self.factory.make(&request.order_type)?;
        let declared = request.pay_amount;
        let coupon_ids = request.coupon_ids.clone();
        let order = self.new_entity(request)?;

        strategy.validate(&order).await?;

        advance(stage, SubmitStage::BuildingDraft);
        let mut order = strategy.build_draft(order).await?;

        advance(stage, SubmitStage::LockingStock);
        let lines = OrderStockService::normalize(strategy.stock_lines(&order));
        let guard = self.stock.acquire(&lines).await?;

        let outcome = self
            .run_locked(strategy.as_ref(), &mut order, &lines, &guard, &coupon_ids, declared, stage)
            .await;
        self.stock.release(guard);
        outcome?;

        let order_id = order
            .id
            .ok_or_else(|| OrderError::Internal("order id missing after save".to_string()))?;
        Ok(SubmitOrderResult {
            order_id,
            order_no: order.order_no.clone(),
            pay_amount: order.pay_amount(),
            order,
        })
    }

    /// 持锁阶段：预占之后的失败补回库存
    #[allow(clippy::too_many_arguments)]
    async fn run_locked(
        &self,
        strategy: &dyn OrderTypeStrategy,
        order: &mut OrderEntity,
        lines: &[StockLine],
        guard: &StockLockGuard,
        coupon_ids: &[i64],
        declared: i64,
        stage: &mut SubmitStage,
    ) -> OrderResult<()> {
        advance(stage, SubmitStage::ReservingStock);
        let reservation = self.stock.reserve(guard, lines).await?;

        let result = self
            .run_reserved(strategy, order, coupon_ids, declared, stage)
            .await;
        if result.is_err() {
            self.stock.rollback(&reservation).await;
        }
        result
    }

    async fn run_reserved(
        &self,
        strategy: &dyn OrderTypeStrategy,
        order: &mut OrderEntity,
        coupon_ids: &[i64],
        declared: i64,
        stage: &mut SubmitStage,
    ) -> OrderResult<()> {
        advance(stage, SubmitStage::ApplyingCoupon);
        strategy.apply_coupon(order, coupon_ids).await?;

        advance(stage, SubmitStage::AdjustingPrice);
        strategy.adjust_price(order).await?;

        advance(stage, SubmitStage::VerifyingPrice);
        Self::verify_price(order, declared)?;

        advance(stage, SubmitStage::Persisting);
        let persisted = self.persist(order).await?;
        order.id = Some(persisted.id);
        order.order_no = persisted.order_no;

        advance(stage, SubmitStage::PostCreate);
        if let Err(e) = strategy.post_create(order).await {
            self.compensate(order).await;
            return Err(e);
        }
        Ok(())
    }

    /// 生成订单号并保存，订单号冲突时重新生成
    async fn persist(&self, order: &mut OrderEntity) -> OrderResult<PersistedOrder> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            order.order_no = generate_order_no(&self.settings.order_no_prefix, self.clock.now());
            match self.orders.save(order).await {
                Err(RepoError::Duplicate(reason)) if attempt < ORDER_NO_ATTEMPTS => {
                    tracing::debug!(%reason, attempt, "Order number taken, regenerating");
                }
                result => return Ok(result?),
            }
        }
    }

    /// 订单已保存但后续副作用失败：取消订单
    async fn compensate(&self, order: &mut OrderEntity) {
        let Some(id) = order.id else { return };
        match self
            .orders
            .update_status(id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await
        {
            Ok(true) => {
                order.status = OrderStatus::Cancelled;
                tracing::info!(order_id = id, order_no = %order.order_no, "Order cancelled after post-create failure");
            }
            Ok(false) => {
                tracing::warn!(order_id = id, "Order not pending, compensation skipped");
            }
            Err(e) => {
                tracing::error!(order_id = id, error = %e, "Failed to cancel order after post-create failure");
            }
        }
    }

    /// 验价：订单应付金额必须与前端声明金额完全相等
    pub fn verify_price(order: &OrderEntity, declared: i64) -> OrderResult<()> {
        let actual = order.pay_amount();
        if actual != declared {
            tracing::debug!(declared, actual, "Price mismatch");
            return Err(OrderError::PriceMismatch { declared, actual });
        }
        Ok(())
    }

    /// 支付回调
    ///
    /// 订单 `pending → paid`；拼团订单同时标记拼团行已支付并尝试成团。
    pub async fn mark_paid(&self, order_id: i64) -> OrderResult<OrderEntity> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        let paid_at = self.clock.now();
        match order.group_buy_id() {
            Some(group_buy_id) => {
                let activity = self.group_buys.load_activity(group_buy_id).await?;
                self.lifecycle
                    .confirm_payment(&order, group_buy_id, activity.min_people, paid_at)
                    .await?;
            }
            None => {
                if !self.orders.mark_paid(order_id, paid_at).await? {
                    let current = self.orders.find_by_id(order_id).await?;
                    return Err(OrderError::not_payable(current.as_ref().unwrap_or(&order)));
                }
            }
        }
        tracing::info!(order_id, order_no = %order.order_no, "Order paid");

        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))
    }

    fn new_entity(&self, request: SubmitOrderRequest) -> OrderResult<OrderEntity> {
        let context = match OrderType::parse(&request.order_type) {
            Some(OrderType::GroupBuy) => OrderContext::GroupBuy {
                group_buy_id: request
                    .group_buy_id
                    .ok_or_else(|| OrderError::Validation("缺少拼团活动".to_string()))?,
                group_no: request.group_no.filter(|g| !g.is_empty()),
            },
            Some(OrderType::Seckill) => OrderContext::Seckill {
                seckill_id: request
                    .seckill_id
                    .ok_or_else(|| OrderError::Validation("缺少秒杀活动".to_string()))?,
            },
            Some(OrderType::Normal) | None => OrderContext::Normal,
        };

        let items = request
            .items
            .iter()
            .map(|i| OrderItemEntity::new(i.product_id, i.sku_id, i.quantity))
            .collect();

        let mut order = OrderEntity::new(
            request.member_id,
            request.order_type,
            items,
            context,
            self.clock.now(),
        );
        order.address = request.address;
        order.remark = request.remark;
        Ok(order)
    }
}

fn advance(stage: &mut SubmitStage, next: SubmitStage) {
    tracing::debug!(from = %stage, to = %next, "Submit stage");
    *stage = next;
}
