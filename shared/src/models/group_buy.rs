//! Group-buy (拼团) models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 拼团活动状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupBuyActivityStatus {
    Draft,
    Active,
    Finished,
}

/// 拼团活动
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupBuyEntity {
    pub id: i64,
    pub product_id: i64,
    pub sku_id: i64,
    pub title: String,
    pub total_quantity: i64,
    pub sold_quantity: i64,
    pub min_people: i64,
    pub max_people: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// 成团时限 (小时)
    pub group_time_limit: i64,
    pub status: GroupBuyActivityStatus,
    pub is_enabled: bool,
    /// 原价 (分)
    pub original_price: i64,
    /// 拼团价 (分)
    pub group_price: i64,
    pub group_count: i64,
    pub success_group_count: i64,
}

impl GroupBuyEntity {
    pub fn remaining_quantity(&self) -> i64 {
        self.total_quantity - self.sold_quantity
    }

    /// 启用 && 进行中 && 未售罄 && 在活动时间窗内
    pub fn can_join(&self, now: DateTime<Utc>) -> bool {
        self.is_enabled
            && self.status == GroupBuyActivityStatus::Active
            && self.sold_quantity < self.total_quantity
            && self.start_time <= now
            && now <= self.end_time
    }
}

/// 拼团订单行状态
///
/// `pending → paid → grouped`，超时未成团时 `pending|paid → failed`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GroupBuyOrderStatus {
    Pending,
    Paid,
    Grouped,
    Failed,
}

impl GroupBuyOrderStatus {
    /// 仍处于成团等待中的状态
    pub fn is_open(&self) -> bool {
        matches!(self, GroupBuyOrderStatus::Pending | GroupBuyOrderStatus::Paid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBuyOrderStatus::Pending => "pending",
            GroupBuyOrderStatus::Paid => "paid",
            GroupBuyOrderStatus::Grouped => "grouped",
            GroupBuyOrderStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for GroupBuyOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 拼团订单行
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupBuyOrder {
    /// 持久化后回填
    pub id: Option<i64>,
    pub group_buy_id: i64,
    pub order_id: i64,
    pub member_id: i64,
    pub sku_id: i64,
    pub quantity: i64,
    pub is_leader: bool,
    pub group_no: String,
    /// 参团订单指向团长订单
    pub parent_order_id: Option<i64>,
    pub share_code: Option<String>,
    pub join_time: DateTime<Utc>,
    pub expire_time: DateTime<Utc>,
    pub group_time: Option<DateTime<Utc>>,
    pub status: GroupBuyOrderStatus,
    pub original_price: i64,
    pub group_price: i64,
    pub total_amount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn activity(now: DateTime<Utc>) -> GroupBuyEntity {
        GroupBuyEntity {
            id: 1,
            product_id: 100,
            sku_id: 1000,
            title: "test".to_string(),
            total_quantity: 10,
            sold_quantity: 0,
            min_people: 2,
            max_people: 5,
            start_time: now - Duration::hours(1),
            end_time: now + Duration::hours(1),
            group_time_limit: 24,
            status: GroupBuyActivityStatus::Active,
            is_enabled: true,
            original_price: 10_000,
            group_price: 8_000,
            group_count: 0,
            success_group_count: 0,
        }
    }

    #[test]
    fn test_can_join() {
        let now = Utc::now();
        assert!(activity(now).can_join(now));

        let mut a = activity(now);
        a.is_enabled = false;
        assert!(!a.can_join(now));

        let mut a = activity(now);
        a.status = GroupBuyActivityStatus::Finished;
        assert!(!a.can_join(now));

        let mut a = activity(now);
        a.sold_quantity = 10;
        assert!(!a.can_join(now));

        let a = activity(now);
        assert!(!a.can_join(now + Duration::hours(2)));
        assert!(!a.can_join(now - Duration::hours(2)));
    }

    #[test]
    fn test_open_statuses() {
        assert!(GroupBuyOrderStatus::Pending.is_open());
        assert!(GroupBuyOrderStatus::Paid.is_open());
        assert!(!GroupBuyOrderStatus::Grouped.is_open());
        assert!(!GroupBuyOrderStatus::Failed.is_open());
    }
}
