//! 下单并发测试
//!
//! 多线程运行时下大量订单同时抢同一批 SKU：
//! - 库存不超卖，成功数与扣减量一致
//! - 交叉顺序的多 SKU 订单不死锁
//! - 结束后没有残留的库存锁
//! - 同一个团并发参团不超员

use chrono::{Duration, Utc};
use mall_server::db::repository::StockKey;
use mall_server::{Config, MemoryStore, OrderError, ServerState, SubmitItem, SubmitOrderRequest};
use rand::Rng;
use rand::seq::SliceRandom;
use shared::models::{
    GroupBuyActivityStatus, GroupBuyEntity, GroupBuyOrderStatus, ProductStatus, SkuSnapshot,
};
use shared::order::{Address, OrderStatus};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const ORDER_COUNT: usize = 200;

fn config() -> Config {
    Config {
        environment: "test".to_string(),
        log_level: "warn".to_string(),
        log_json: false,
        log_dir: None,
        stock_lock_timeout_ms: 10_000,
        group_sweep_interval_secs: 60,
        free_shipping_threshold: 9900,
        base_shipping_fee: 1000,
        order_no_prefix: "MO".to_string(),
    }
}

fn address() -> Address {
    Address {
        receiver_name: "李四".to_string(),
        phone: "13900000000".to_string(),
        province: "广东省".to_string(),
        city: "深圳市".to_string(),
        district: "南山区".to_string(),
        detail: "科技园 8 号".to_string(),
    }
}

fn sku(sku_id: i64, product_id: i64, price: i64, stock: i64) -> SkuSnapshot {
    SkuSnapshot {
        product_id,
        sku_id,
        product_name: format!("商品{}", product_id),
        sku_name: None,
        price,
        stock,
        status: ProductStatus::OnSale,
    }
}

fn request(member_id: i64, order_type: &str, items: Vec<(i64, i64, i32)>, pay_amount: i64) -> SubmitOrderRequest {
    SubmitOrderRequest {
        member_id,
        order_type: order_type.to_string(),
        items: items
            .into_iter()
            .map(|(product_id, sku_id, quantity)| SubmitItem {
                product_id,
                sku_id,
                quantity,
            })
            .collect(),
        address: Some(address()),
        coupon_ids: Vec::new(),
        group_buy_id: None,
        group_no: None,
        seckill_id: None,
        pay_amount,
        remark: None,
    }
}

fn setup() -> (ServerState, Arc<MemoryStore>) {
    let (state, store) = ServerState::in_memory(config());
    // 1000 + 2000 = 3000 < 9900，需付运费
    store.insert_sku(sku(1, 1, 1_000, 60));
    store.insert_sku(sku(2, 2, 2_000, 60));
    (state, store)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_orders_never_oversell() {
    let (state, store) = setup();

    // 预先生成订单计划 (ThreadRng 不能跨 await)
    let plans: Vec<(i64, Vec<(i64, i64, i32)>)> = {
        let mut rng = rand::thread_rng();
        (0..ORDER_COUNT)
            .map(|i| {
                let mut items = vec![(1, 1, 1), (2, 2, 1)];
                // 交叉的明细顺序
                items.shuffle(&mut rng);
                (i as i64 + 1, items)
            })
            .collect()
    };

    let succeeded = Arc::new(AtomicUsize::new(0));
    let sold_out = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = plans
        .into_iter()
        .map(|(member_id, items)| {
            let service = state.orders.clone();
            let succeeded = succeeded.clone();
            let sold_out = sold_out.clone();
            tokio::spawn(async move {
                match service.submit(request(member_id, "normal", items, 4_000)).await {
                    Ok(_) => {
                        succeeded.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(OrderError::OutOfStock(_)) => {
                        sold_out.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(e) => panic!("unexpected submit error: {}", e),
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(succeeded.load(Ordering::SeqCst), 60);
    assert_eq!(sold_out.load(Ordering::SeqCst), ORDER_COUNT - 60);
    assert_eq!(store.stock(StockKey::Sku(1)), 0);
    assert_eq!(store.stock(StockKey::Sku(2)), 0);
    assert_eq!(store.orders().len(), 60);
    assert!(store.orders().iter().all(|o| o.status == OrderStatus::Pending));
    assert_eq!(state.stock.held_locks(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn random_quantities_conserve_stock() {
    let (state, store) = setup();

    let plans: Vec<(i64, i32, i32)> = {
        let mut rng = rand::thread_rng();
        (0..ORDER_COUNT)
            .map(|i| (i as i64 + 1, rng.gen_range(1..=3), rng.gen_range(1..=3)))
            .collect()
    };

    let handles: Vec<_> = plans
        .into_iter()
        .map(|(member_id, qa, qb)| {
            let service = state.orders.clone();
            let goods = 1_000 * i64::from(qa) + 2_000 * i64::from(qb);
            let pay = if goods >= 9_900 { goods } else { goods + 1_000 };
            tokio::spawn(async move {
                let items = vec![(2, 2, qb), (1, 1, qa)];
                service
                    .submit(request(member_id, "normal", items, pay))
                    .await
                    .map(|r| (qa, qb, r.order_id))
            })
        })
        .collect();

    let mut sold_a = 0;
    let mut sold_b = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok((qa, qb, _)) => {
                sold_a += i64::from(qa);
                sold_b += i64::from(qb);
            }
            Err(e) => assert!(matches!(e, OrderError::OutOfStock(_)), "unexpected: {}", e),
        }
    }

    assert!(store.stock(StockKey::Sku(1)) >= 0);
    assert!(store.stock(StockKey::Sku(2)) >= 0);
    assert_eq!(store.stock(StockKey::Sku(1)) + sold_a, 60);
    assert_eq!(store.stock(StockKey::Sku(2)) + sold_b, 60);
    assert_eq!(state.stock.held_locks(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_joins_respect_group_size() {
    let (state, store) = setup();
    let now = Utc::now();
    store.insert_sku(sku(1000, 100, 10_000, 100));
    store.insert_group_buy(GroupBuyEntity {
        id: 1,
        product_id: 100,
        sku_id: 1000,
        title: "三人团".to_string(),
        total_quantity: 100,
        sold_quantity: 0,
        min_people: 3,
        max_people: 3,
        start_time: now - Duration::days(1),
        end_time: now + Duration::days(1),
        group_time_limit: 24,
        status: GroupBuyActivityStatus::Active,
        is_enabled: true,
        original_price: 10_000,
        group_price: 8_000,
        group_count: 0,
        success_group_count: 0,
    });

    let group_request = |member_id: i64, group_no: Option<String>| {
        let mut req = request(member_id, "group_buy", vec![(100, 1000, 1)], 9_000);
        req.group_buy_id = Some(1);
        req.group_no = group_no;
        req
    };

    let leader = state.orders.submit(group_request(1, None)).await.unwrap();
    let group_no = store.group_buy_row(leader.order_id).unwrap().group_no;

    let handles: Vec<_> = (2..=21)
        .map(|member_id| {
            let service = state.orders.clone();
            let req = group_request(member_id, Some(group_no.clone()));
            tokio::spawn(async move { service.submit(req).await })
        })
        .collect();

    let mut joined = Vec::new();
    for handle in handles {
        if let Ok(result) = handle.await.unwrap() {
            joined.push(result.order_id);
        }
    }

    assert_eq!(joined.len(), 2);
    let rows = store.group_buy_orders(&group_no);
    assert_eq!(rows.len(), 3);
    assert_eq!(store.group_buy(1).unwrap().sold_quantity, 3);
    // 失败的参团不占库存
    assert_eq!(store.stock(StockKey::Sku(1000)), 97);
    assert_eq!(state.stock.held_locks(), 0);

    // 全部支付后成团
    state.orders.mark_paid(leader.order_id).await.unwrap();
    for order_id in joined {
        state.orders.mark_paid(order_id).await.unwrap();
    }
    assert!(store
        .group_buy_orders(&group_no)
        .iter()
        .all(|r| r.status == GroupBuyOrderStatus::Grouped));
    assert_eq!(store.group_buy(1).unwrap().success_group_count, 1);
}
