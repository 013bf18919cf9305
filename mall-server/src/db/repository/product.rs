//! Product / SKU snapshot provider

use super::RepoResult;
use async_trait::async_trait;
use shared::models::SkuSnapshot;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// `None` 表示 SKU 不存在；下架的 SKU 以 `ProductStatus::Offline` 返回
    async fn find_sku_snapshot(&self, sku_id: i64) -> RepoResult<Option<SkuSnapshot>>;
}
