//! 拼团订单领域服务
//!
//! 参团校验与拼团订单行 (团长 / 团员) 的创建。

use crate::core::Clock;
use crate::db::repository::GroupBuyRepository;
use crate::orders::error::{OrderError, OrderResult};
use chrono::Duration;
use shared::models::{GroupBuyEntity, GroupBuyOrder, GroupBuyOrderStatus};
use shared::order::OrderEntity;
use shared::util::{generate_group_no, generate_share_code};
use std::sync::Arc;

/// 团号碰撞时的最大重试次数
const GROUP_NO_ATTEMPTS: usize = 5;

pub struct DomainGroupBuyOrderService {
    repo: Arc<dyn GroupBuyRepository>,
    clock: Arc<dyn Clock>,
}

impl DomainGroupBuyOrderService {
    pub fn new(repo: Arc<dyn GroupBuyRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub async fn load_activity(&self, group_buy_id: i64) -> OrderResult<GroupBuyEntity> {
        self.repo
            .find_activity(group_buy_id)
            .await?
            .ok_or_else(|| OrderError::GroupBuyNotFound(format!("拼团活动{}", group_buy_id)))
    }

    /// 参团校验
    ///
    /// 按固定优先级短路：
    /// 1. 活动可参与 (`can_join`)
    /// 2. SKU 属于该活动
    /// 3. 剩余库存足够
    /// 4. 会员未参加过该活动
    ///
    /// 携带团号时再校验该团仍可加入。
    pub async fn validate_activity(
        &self,
        group_buy_id: i64,
        sku_id: i64,
        quantity: i64,
        member_id: i64,
        group_no: Option<&str>,
    ) -> OrderResult<GroupBuyEntity> {
        let activity = self.load_activity(group_buy_id).await?;

        if !activity.can_join(self.clock.now()) {
            return Err(OrderError::ActivityNotJoinable);
        }
        if activity.sku_id != sku_id {
            return Err(OrderError::SkuMismatch);
        }
        if activity.remaining_quantity() < quantity {
            return Err(OrderError::InsufficientStock);
        }
        if self.repo.has_member_joined(group_buy_id, member_id).await? {
            return Err(OrderError::DuplicateJoin);
        }

        if let Some(group_no) = group_no {
            self.validate_group(group_no, &activity).await?;
        }

        Ok(activity)
    }

    /// 校验团号对应的团仍可加入
    pub async fn validate_group(&self, group_no: &str, activity: &GroupBuyEntity) -> OrderResult<()> {
        let leader = self
            .repo
            .find_leader_by_group_no(group_no)
            .await?
            .ok_or_else(|| OrderError::GroupBuyNotFound(format!("拼团{}", group_no)))?;

        if leader.group_buy_id != activity.id {
            return Err(OrderError::Validation("该团不属于当前拼团活动".to_string()));
        }
        if !leader.status.is_open() || leader.expire_time <= self.clock.now() {
            return Err(OrderError::Validation("该团已结束".to_string()));
        }
        if activity.max_people > 0
            && self.repo.count_group_members(group_no).await? >= activity.max_people
        {
            return Err(OrderError::Validation("该团人数已满".to_string()));
        }
        Ok(())
    }

    /// 为已持久化的订单创建拼团订单行
    ///
    /// 未携带团号即开团 (团长)，否则参团 (团员)。
    /// 调用方需持有该活动 SKU 的库存锁，复核与写入之间不会插入其它参团。
    pub async fn create_group_buy_order(
        &self,
        order: &OrderEntity,
        activity: &GroupBuyEntity,
    ) -> OrderResult<GroupBuyOrder> {
        let order_id = order
            .id
            .ok_or_else(|| OrderError::Internal("group-buy row for unsaved order".to_string()))?;
        let item = order.items.first().ok_or(OrderError::EmptyOrder)?;
        let quantity = i64::from(item.quantity());
        let join_time = self.clock.now();

        // 下单校验在加锁之前，这里在 SKU 锁内按最新活动数据复核
        let activity = &self.load_activity(activity.id).await?;
        if activity.remaining_quantity() < quantity {
            return Err(OrderError::InsufficientStock);
        }
        if !activity.can_join(join_time) {
            return Err(OrderError::ActivityNotJoinable);
        }
        if self.repo.has_member_joined(activity.id, order.member_id).await? {
            return Err(OrderError::DuplicateJoin);
        }
        if let Some(group_no) = order.group_no() {
            self.validate_group(group_no, activity).await?;
        }

        let mut row = match order.group_no() {
            None => {
                let group_no = self.fresh_group_no().await?;
                GroupBuyOrder {
                    id: None,
                    group_buy_id: activity.id,
                    order_id,
                    member_id: order.member_id,
                    sku_id: item.sku_id,
                    quantity,
                    is_leader: true,
                    group_no,
                    parent_order_id: None,
                    share_code: Some(generate_share_code()),
                    join_time,
                    expire_time: join_time + Duration::hours(activity.group_time_limit),
                    group_time: None,
                    status: GroupBuyOrderStatus::Pending,
                    original_price: activity.original_price,
                    group_price: activity.group_price,
                    total_amount: activity.group_price * quantity,
                }
            }
            Some(group_no) => {
                let leader = self
                    .repo
                    .find_leader_by_group_no(group_no)
                    .await?
                    .ok_or_else(|| OrderError::GroupBuyNotFound(format!("拼团{}", group_no)))?;
                GroupBuyOrder {
                    id: None,
                    group_buy_id: activity.id,
                    order_id,
                    member_id: order.member_id,
                    sku_id: item.sku_id,
                    quantity,
                    is_leader: false,
                    group_no: group_no.to_string(),
                    parent_order_id: Some(leader.order_id),
                    share_code: None,
                    join_time,
                    expire_time: leader.expire_time,
                    group_time: None,
                    status: GroupBuyOrderStatus::Pending,
                    original_price: activity.original_price,
                    group_price: activity.group_price,
                    total_amount: activity.group_price * quantity,
                }
            }
        };

        match serde_json::to_string(&row) {
            Ok(record) => tracing::info!(order_no = %order.order_no, %record, "Creating group-buy order"),
            Err(e) => tracing::warn!(order_no = %order.order_no, error = %e, "Group-buy record not serializable"),
        }

        // 条件扣减活动名额，失败即售罄
        if !self.repo.increase_sold_quantity(activity.id, quantity).await? {
            tracing::info!(group_buy_id = activity.id, quantity, "Group-buy quota exhausted");
            return Err(OrderError::InsufficientStock);
        }
        let id = match self.repo.insert_order(&row).await {
            Ok(id) => id,
            Err(e) => {
                if let Err(undo) = self.repo.decrease_sold_quantity(activity.id, quantity).await {
                    tracing::error!(group_buy_id = activity.id, quantity, error = %undo, "Failed to return group-buy quota");
                }
                return Err(e.into());
            }
        };
        row.id = Some(id);

        if row.is_leader {
            self.repo.increase_group_count(activity.id).await?;
        }

        tracing::info!(
            group_no = %row.group_no,
            group_buy_id = activity.id,
            is_leader = row.is_leader,
            expire_time = %row.expire_time,
            "Group-buy order created"
        );
        Ok(row)
    }

    async fn fresh_group_no(&self) -> OrderResult<String> {
        for _ in 0..GROUP_NO_ATTEMPTS {
            let group_no = generate_group_no(self.clock.now());
            if self.repo.find_leader_by_group_no(&group_no).await?.is_none() {
                return Ok(group_no);
            }
            tracing::debug!(%group_no, "Group number collision, regenerating");
        }
        Err(OrderError::Internal("failed to allocate group number".to_string()))
    }
}
