//! 订单库存服务
//!
//! 库存计数器的唯一写入方。一次下单先按确定顺序锁住订单涉及的全部
//! [`StockKey`]，再整体预占；锁由 [`StockLockGuard`] 持有，任何退出路径
//! (包括 panic 与 future 被取消) 都会在 drop 时释放。

use crate::db::repository::{StockKey, StockRepository};
use crate::orders::error::{OrderError, OrderResult};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// 一个库存计数器上的扣减量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLine {
    pub key: StockKey,
    pub quantity: i64,
}

impl StockLine {
    pub fn new(key: StockKey, quantity: i64) -> Self {
        Self { key, quantity }
    }
}

/// 已持有的库存锁
#[derive(Debug)]
pub struct StockLockGuard {
    guards: Vec<(StockKey, OwnedMutexGuard<()>)>,
    held: Arc<AtomicUsize>,
}

impl StockLockGuard {
    pub fn keys(&self) -> Vec<StockKey> {
        self.guards.iter().map(|(k, _)| *k).collect()
    }

    fn covers(&self, key: &StockKey) -> bool {
        self.guards.iter().any(|(k, _)| k == key)
    }
}

impl Drop for StockLockGuard {
    fn drop(&mut self) {
        self.held.fetch_sub(self.guards.len(), Ordering::SeqCst);
        // 逆序释放
        while let Some((key, guard)) = self.guards.pop() {
            drop(guard);
            tracing::trace!(stock_key = %key, "Stock lock released");
        }
    }
}

/// 一次成功预占的记录，用于回滚
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reservation {
    lines: Vec<StockLine>,
}

impl Reservation {
    pub fn lines(&self) -> &[StockLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

pub struct OrderStockService {
    repo: Arc<dyn StockRepository>,
    locks: DashMap<StockKey, Arc<Mutex<()>>>,
    lock_timeout: Duration,
    held: Arc<AtomicUsize>,
}

impl OrderStockService {
    pub fn new(repo: Arc<dyn StockRepository>, lock_timeout: Duration) -> Self {
        Self {
            repo,
            locks: DashMap::new(),
            lock_timeout,
            held: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 合并同一计数器上的多行，按加锁顺序排序，去掉数量为 0 的行
    pub fn normalize(lines: impl IntoIterator<Item = StockLine>) -> Vec<StockLine> {
        let mut merged: BTreeMap<StockKey, i64> = BTreeMap::new();
        for line in lines {
            *merged.entry(line.key).or_insert(0) += line.quantity;
        }
        merged
            .into_iter()
            .filter(|(_, qty)| *qty > 0)
            .map(|(key, quantity)| StockLine { key, quantity })
            .collect()
    }

    /// 按 key 顺序获取全部锁
    ///
    /// 任一 key 等待超过 `lock_timeout` 即失败，已拿到的锁随之释放。
    pub async fn acquire(&self, lines: &[StockLine]) -> OrderResult<StockLockGuard> {
        let mut keys: Vec<StockKey> = lines.iter().map(|l| l.key).collect();
        keys.sort();
        keys.dedup();

        let mut guard = StockLockGuard {
            guards: Vec::with_capacity(keys.len()),
            held: self.held.clone(),
        };

        for key in keys {
            // clone 出 Arc 后立即释放 DashMap 分片锁，不能跨 await 持有
            let mutex = self
                .locks
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone();

            match tokio::time::timeout(self.lock_timeout, mutex.lock_owned()).await {
                Ok(owned) => {
                    self.held.fetch_add(1, Ordering::SeqCst);
                    guard.guards.push((key, owned));
                    tracing::trace!(stock_key = %key, "Stock lock acquired");
                }
                Err(_) => {
                    tracing::warn!(
                        stock_key = %key,
                        timeout_ms = self.lock_timeout.as_millis() as u64,
                        "Stock lock wait timed out"
                    );
                    return Err(OrderError::StockBusy(key));
                }
            }
        }

        Ok(guard)
    }

    /// 预占库存
    ///
    /// 先整体校验可用量，再逐行条件扣减；中途失败则把已扣减的补回。
    pub async fn reserve(
        &self,
        guard: &StockLockGuard,
        lines: &[StockLine],
    ) -> OrderResult<Reservation> {
        if let Some(line) = lines.iter().find(|l| !guard.covers(&l.key)) {
            return Err(OrderError::Internal(format!(
                "stock key {} reserved without lock",
                line.key
            )));
        }

        for line in lines {
            let available = self.repo.available(line.key).await?;
            if available < line.quantity {
                tracing::debug!(
                    stock_key = %line.key,
                    available,
                    requested = line.quantity,
                    "Insufficient stock"
                );
                return Err(OrderError::OutOfStock(line.key));
            }
        }

        let mut reserved = Reservation::default();
        for line in lines {
            let result = self.repo.decrement(line.key, line.quantity).await;
            match result {
                Ok(true) => reserved.lines.push(*line),
                Ok(false) => {
                    self.rollback(&reserved).await;
                    return Err(OrderError::OutOfStock(line.key));
                }
                Err(e) => {
                    self.rollback(&reserved).await;
                    return Err(e.into());
                }
            }
        }

        tracing::debug!(lines = reserved.lines.len(), "Stock reserved");
        Ok(reserved)
    }

    /// 补回预占的库存
    ///
    /// 单行失败只记录日志，继续补回其余行。
    pub async fn rollback(&self, reservation: &Reservation) {
        for line in reservation.lines.iter().rev() {
            if let Err(e) = self.repo.increment(line.key, line.quantity).await {
                tracing::error!(
                    stock_key = %line.key,
                    quantity = line.quantity,
                    error = %e,
                    "Failed to roll back stock reservation"
                );
            }
        }
        if !reservation.is_empty() {
            tracing::info!(lines = reservation.lines.len(), "Stock reservation rolled back");
        }
    }

    /// 释放全部锁，并清理无人等待的锁条目
    pub fn release(&self, guard: StockLockGuard) {
        let keys = guard.keys();
        drop(guard);
        for key in keys {
            self.locks
                .remove_if(&key, |_, mutex| Arc::strong_count(mutex) == 1);
        }
    }

    /// 当前被持有的锁数量
    pub fn held_locks(&self) -> usize {
        self.held.load(Ordering::SeqCst)
    }
}
