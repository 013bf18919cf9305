//! 编号生成工具

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;

/// 团号: `GB` + yyyymmdd + 8 位随机数字
pub fn generate_group_no(now: DateTime<Utc>) -> String {
    let n: u32 = rand::thread_rng().gen_range(0..100_000_000);
    format!("GB{}{:08}", now.format("%Y%m%d"), n)
}

/// 分享码: 8 位大写字母数字
pub fn generate_share_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect()
}

/// 订单号: 前缀 + yyyymmddHHMMSS + 6 位随机数字
pub fn generate_order_no(prefix: &str, now: DateTime<Utc>) -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{}{}{:06}", prefix, now.format("%Y%m%d%H%M%S"), n)
}
