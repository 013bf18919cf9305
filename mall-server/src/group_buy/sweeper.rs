//! 拼团过期扫描
//!
//! 按固定间隔调用 `cancel_expired_groups`，收到 shutdown 信号后退出。
//! 扫描幂等，重复执行不会重复退款。

use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::lifecycle::DomainGroupBuyLifecycleService;

/// 拼团过期扫描器
///
/// 注册为 `TaskKind::Periodic`，在 `start_background_tasks()` 中启动。
pub struct GroupBuySweeper {
    lifecycle: Arc<DomainGroupBuyLifecycleService>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl GroupBuySweeper {
    pub fn new(
        lifecycle: Arc<DomainGroupBuyLifecycleService>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            lifecycle,
            interval,
            shutdown,
        }
    }

    /// 主循环：立即扫描一次，之后按间隔触发
    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Group-buy sweeper started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Group-buy sweeper received shutdown signal");
                    break;
                }
            }
        }

        tracing::info!("Group-buy sweeper stopped");
    }

    /// 执行一次扫描，返回处理的过期团数
    pub async fn sweep_once(&self) -> usize {
        match self.lifecycle.cancel_expired_groups().await {
            Ok(0) => {
                tracing::debug!("No expired groups");
                0
            }
            Ok(n) => {
                tracing::info!(groups = n, "Expired groups cancelled");
                n
            }
            Err(e) => {
                tracing::error!(error = %e, "Group-buy sweep failed");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Clock, ManualClock};
    use crate::db::MemoryStore;
    use crate::services::refund::LoggingRefundGateway;
    use crate::testing::{group_buy_activity, group_buy_order, saved_order};
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use shared::models::GroupBuyOrderStatus;
    use shared::order::OrderStatus;

    fn lifecycle(store: Arc<MemoryStore>, clock: Arc<ManualClock>) -> Arc<DomainGroupBuyLifecycleService> {
        Arc::new(DomainGroupBuyLifecycleService::new(
            store.clone(),
            store,
            Arc::new(LoggingRefundGateway::new()),
            clock,
        ))
    }

    #[tokio::test]
    async fn test_sweep_once_expires_groups() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 15, 10, 0, 0).unwrap(),
        ));
        let store = Arc::new(MemoryStore::new());
        store.insert_group_buy(group_buy_activity(1, clock.now()));
        let order_id = store.seed_order(saved_order(1, OrderStatus::Pending, clock.now()));
        store.insert_group_buy_order(group_buy_order(1, order_id, 1, "GB2026031500000001", true, clock.now()));

        let sweeper = GroupBuySweeper::new(
            lifecycle(store.clone(), clock.clone()),
            Duration::from_secs(60),
            CancellationToken::new(),
        );
        assert_eq!(sweeper.sweep_once().await, 0);

        clock.advance(ChronoDuration::hours(25));
        assert_eq!(sweeper.sweep_once().await, 1);
        assert_eq!(
            store.group_buy_orders("GB2026031500000001")[0].status,
            GroupBuyOrderStatus::Failed
        );
        assert_eq!(sweeper.sweep_once().await, 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = Arc::new(MemoryStore::new());
        let token = CancellationToken::new();
        let sweeper = GroupBuySweeper::new(lifecycle(store, clock), Duration::from_millis(10), token.clone());

        let handle = tokio::spawn(sweeper.run());
        tokio::time::sleep(Duration::from_millis(30)).await;
        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should stop")
            .unwrap();
    }
}
