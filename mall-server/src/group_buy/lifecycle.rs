//! 拼团生命周期
//!
//! 成团判定与过期失败。同一团号的处理在进程内串行 (按团号加锁)，
//! 状态翻转本身是仓储层的条件更新，重复执行不会二次生效。

use crate::core::Clock;
use crate::db::repository::{GroupBuyRepository, OrderRepository};
use crate::orders::error::{OrderError, OrderResult};
use crate::services::refund::RefundGateway;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use shared::models::{GroupBuyOrder, GroupBuyOrderStatus};
use shared::order::{OrderEntity, OrderStatus};
use std::sync::Arc;
use tokio::sync::Mutex;

/// 单个过期团的处理结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExpiredGroupOutcome {
    pub failed_rows: usize,
    pub refunded: usize,
    pub refund_failures: usize,
    pub cancelled: usize,
}

pub struct DomainGroupBuyLifecycleService {
    group_buys: Arc<dyn GroupBuyRepository>,
    orders: Arc<dyn OrderRepository>,
    refunds: Arc<dyn RefundGateway>,
    clock: Arc<dyn Clock>,
    group_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl DomainGroupBuyLifecycleService {
    pub fn new(
        group_buys: Arc<dyn GroupBuyRepository>,
        orders: Arc<dyn OrderRepository>,
        refunds: Arc<dyn RefundGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            group_buys,
            orders,
            refunds,
            clock,
            group_locks: DashMap::new(),
        }
    }

    /// 已支付人数达到 `min_people` 时成团
    ///
    /// 返回本次调用是否完成了成团。
    pub async fn check_and_complete_group(
        &self,
        group_no: &str,
        group_buy_id: i64,
        min_people: i64,
    ) -> OrderResult<bool> {
        let lock = self.group_lock(group_no);
        let completed = {
            let _held = lock.lock().await;
            self.complete_locked(group_no, group_buy_id, min_people).await
        };
        drop(lock);
        self.prune_lock(group_no);
        completed
    }

    /// 拼团订单支付：订单与拼团行在团号锁内一起置为已支付，随后尝试成团
    ///
    /// 与过期扫描互斥；团已失败时拒绝支付。返回本次支付是否促成成团。
    pub async fn confirm_payment(
        &self,
        order: &OrderEntity,
        group_buy_id: i64,
        min_people: i64,
        paid_at: DateTime<Utc>,
    ) -> OrderResult<bool> {
        let order_id = order
            .id
            .ok_or_else(|| OrderError::Internal("payment for unsaved order".to_string()))?;
        let group_no = self
            .group_buys
            .find_by_order_id(order_id)
            .await?
            .ok_or_else(|| OrderError::GroupBuyNotFound(format!("订单{}的拼团记录", order_id)))?
            .group_no;

        let lock = self.group_lock(&group_no);
        let result = {
            let _held = lock.lock().await;
            self.pay_locked(order, order_id, &group_no, group_buy_id, min_people, paid_at)
                .await
        };
        drop(lock);
        self.prune_lock(&group_no);
        result
    }

    async fn pay_locked(
        &self,
        order: &OrderEntity,
        order_id: i64,
        group_no: &str,
        group_buy_id: i64,
        min_people: i64,
        paid_at: DateTime<Utc>,
    ) -> OrderResult<bool> {
        // 等锁期间团可能已被扫描置为失败
        let row = self
            .group_buys
            .find_by_order_id(order_id)
            .await?
            .ok_or_else(|| OrderError::GroupBuyNotFound(format!("订单{}的拼团记录", order_id)))?;
        if row.status == GroupBuyOrderStatus::Failed {
            tracing::warn!(order_id, %group_no, "Payment for failed group rejected");
            return Err(OrderError::InvalidStatus(format!("拼团{}已结束", group_no)));
        }

        if !self.orders.mark_paid(order_id, paid_at).await? {
            // 按最新状态报错
            let current = self.orders.find_by_id(order_id).await?;
            return Err(OrderError::not_payable(current.as_ref().unwrap_or(order)));
        }
        if row.status == GroupBuyOrderStatus::Pending
            && !self.group_buys.mark_paid(order_id).await?
        {
            tracing::warn!(order_id, %group_no, "Group-buy row not pending, payment mark skipped");
        }
        tracing::debug!(order_id, %group_no, row_status = ?row.status, "Group-buy order paid");

        self.complete_locked(group_no, group_buy_id, min_people).await
    }

    async fn complete_locked(
        &self,
        group_no: &str,
        group_buy_id: i64,
        min_people: i64,
    ) -> OrderResult<bool> {
        let paid = self.group_buys.count_paid_orders(group_no).await?;
        if paid < min_people {
            tracing::debug!(%group_no, paid, min_people, "Group quorum not reached");
            return Ok(false);
        }

        let group_time = self.clock.now();
        let flipped = self.group_buys.complete_group(group_no, group_time).await?;
        if flipped == 0 {
            tracing::debug!(%group_no, "Group already settled");
            return Ok(false);
        }

        self.group_buys.increase_success_group_count(group_buy_id).await?;
        tracing::info!(
            %group_no,
            group_buy_id,
            paid,
            rows = flipped,
            %group_time,
            "Group completed"
        );
        Ok(true)
    }

    /// 处理全部已过期的团，返回处理的团数
    ///
    /// 每个团独立处理：单个团出错只记录日志，不影响其它团。
    pub async fn cancel_expired_groups(&self) -> OrderResult<usize> {
        let now = self.clock.now();
        let group_nos = self.group_buys.find_expired_group_nos(now).await?;
        if group_nos.is_empty() {
            return Ok(0);
        }

        tracing::info!(count = group_nos.len(), "Expired groups found");
        let mut processed = 0;
        for group_no in &group_nos {
            match self.expire_group(group_no).await {
                Ok(Some(outcome)) => {
                    processed += 1;
                    tracing::info!(
                        %group_no,
                        rows = outcome.failed_rows,
                        refunded = outcome.refunded,
                        refund_failures = outcome.refund_failures,
                        cancelled = outcome.cancelled,
                        "Expired group processed"
                    );
                }
                Ok(None) => {
                    tracing::debug!(%group_no, "Group settled concurrently, skipped");
                }
                Err(e) => {
                    tracing::error!(%group_no, error = %e, "Failed to process expired group");
                }
            }
        }
        Ok(processed)
    }

    /// 单个团置为失败；已被其它写入方处理时返回 `None`
    pub async fn expire_group(&self, group_no: &str) -> OrderResult<Option<ExpiredGroupOutcome>> {
        let lock = self.group_lock(group_no);
        let result = {
            let _held = lock.lock().await;
            self.expire_locked(group_no).await
        };
        drop(lock);
        self.prune_lock(group_no);
        result
    }

    async fn expire_locked(&self, group_no: &str) -> OrderResult<Option<ExpiredGroupOutcome>> {
        let rows = self.group_buys.fail_group(group_no).await?;
        if rows.is_empty() {
            return Ok(None);
        }

        let mut outcome = ExpiredGroupOutcome {
            failed_rows: rows.len(),
            ..Default::default()
        };
        for row in &rows {
            match row.status {
                GroupBuyOrderStatus::Paid => {
                    if self.refund_row(row).await {
                        outcome.refunded += 1;
                    } else {
                        outcome.refund_failures += 1;
                    }
                }
                GroupBuyOrderStatus::Pending => {
                    match self
                        .orders
                        .update_status(row.order_id, OrderStatus::Pending, OrderStatus::Cancelled)
                        .await
                    {
                        Ok(true) => outcome.cancelled += 1,
                        Ok(false) => {
                            tracing::warn!(order_id = row.order_id, "Unpaid order not pending, left as is")
                        }
                        Err(e) => {
                            tracing::error!(order_id = row.order_id, error = %e, "Failed to cancel unpaid order")
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(Some(outcome))
    }

    /// 退款失败只记录日志，订单保持已支付
    async fn refund_row(&self, row: &GroupBuyOrder) -> bool {
        let order = match self.orders.find_by_id(row.order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                tracing::error!(order_id = row.order_id, group_no = %row.group_no, "Paid order missing, refund skipped");
                return false;
            }
            Err(e) => {
                tracing::error!(order_id = row.order_id, error = %e, "Failed to load order for refund");
                return false;
            }
        };

        if let Err(e) = self.refunds.trigger_refund(&order).await {
            tracing::error!(
                order_id = row.order_id,
                order_no = %order.order_no,
                group_no = %row.group_no,
                error = %e,
                "Refund failed, skipped"
            );
            return false;
        }

        match self
            .orders
            .update_status(row.order_id, OrderStatus::Paid, OrderStatus::Refunded)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(order_id = row.order_id, error = %e, "Refund accepted but order status not updated");
                false
            }
        }
    }

    fn group_lock(&self, group_no: &str) -> Arc<Mutex<()>> {
        self.group_locks
            .entry(group_no.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn prune_lock(&self, group_no: &str) {
        self.group_locks
            .remove_if(group_no, |_, lock| Arc::strong_count(lock) == 1);
    }
}
