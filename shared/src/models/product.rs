//! Product / SKU snapshot

use serde::{Deserialize, Serialize};

/// 商品上下架状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    OnSale,
    Offline,
}

/// SKU 实时快照 (价格 / 库存 / 状态)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkuSnapshot {
    pub product_id: i64,
    pub sku_id: i64,
    pub product_name: String,
    pub sku_name: Option<String>,
    /// 售价 (分)
    pub price: i64,
    pub stock: i64,
    pub status: ProductStatus,
}

impl SkuSnapshot {
    pub fn is_on_sale(&self) -> bool {
        self.status == ProductStatus::OnSale
    }
}
