//! 订单类型策略工厂

use std::collections::HashMap;
use std::sync::Arc;

use super::error::{OrderError, OrderResult};
use super::strategy::OrderTypeStrategy;

/// 订单类型 → 策略实例
///
/// 多个策略声明同一类型时，后注册的覆盖先注册的。
pub struct OrderTypeStrategyFactory {
    strategies: HashMap<String, Arc<dyn OrderTypeStrategy>>,
}

impl OrderTypeStrategyFactory {
    pub fn new(strategies: Vec<Arc<dyn OrderTypeStrategy>>) -> Self {
        let mut map: HashMap<String, Arc<dyn OrderTypeStrategy>> = HashMap::new();
        for strategy in strategies {
            let order_type = strategy.order_type().to_string();
            if map.insert(order_type.clone(), strategy).is_some() {
                tracing::debug!(%order_type, "Order type strategy replaced by later registration");
            }
        }
        Self { strategies: map }
    }

    pub fn make(&self, order_type: &str) -> OrderResult<Arc<dyn OrderTypeStrategy>> {
        self.strategies
            .get(order_type)
            .cloned()
            .ok_or_else(|| OrderError::UnknownOrderType(order_type.to_string()))
    }

    /// 已注册的类型 (排序)
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.strategies.keys().cloned().collect();
        types.sort();
        types
    }
}
