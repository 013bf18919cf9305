//! Seckill (秒杀) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 秒杀活动
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeckillActivity {
    pub id: i64,
    pub product_id: i64,
    pub sku_id: i64,
    pub title: String,
    /// 秒杀价 (分)
    pub seckill_price: i64,
    /// 活动库存 (独立于 SKU 库存)
    pub stock: i64,
    /// 每人限购数量，0 表示不限
    pub limit_per_member: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_enabled: bool,
}

impl SeckillActivity {
    pub fn is_running(&self, now: DateTime<Utc>) -> bool {
        self.is_enabled && self.start_time <= now && now <= self.end_time
    }
}
