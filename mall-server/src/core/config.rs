use std::time::Duration;

/// 服务配置 - 订单与活动核心的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | 是否输出 JSON 日志 |
/// | LOG_DIR | (无) | 日志目录，设置后按天滚动写文件 |
/// | STOCK_LOCK_TIMEOUT_MS | 3000 | SKU 库存锁等待超时(毫秒) |
/// | GROUP_SWEEP_INTERVAL_SECS | 60 | 拼团过期扫描间隔(秒) |
/// | FREE_SHIPPING_THRESHOLD | 9900 | 包邮门槛(分)，0 表示不包邮 |
/// | BASE_SHIPPING_FEE | 1000 | 基础运费(分) |
/// | ORDER_NO_PREFIX | MO | 订单号前缀 |
///
/// # 示例
///
/// ```ignore
/// STOCK_LOCK_TIMEOUT_MS=500 GROUP_SWEEP_INTERVAL_SECS=10 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 日志级别
    pub log_level: String,
    /// JSON 格式日志
    pub log_json: bool,
    /// 日志目录
    pub log_dir: Option<String>,
    /// SKU 库存锁等待超时 (毫秒)
    pub stock_lock_timeout_ms: u64,
    /// 拼团过期扫描间隔 (秒)
    pub group_sweep_interval_secs: u64,
    /// 包邮门槛 (分)
    pub free_shipping_threshold: i64,
    /// 基础运费 (分)
    pub base_shipping_fee: i64,
    /// 订单号前缀
    pub order_no_prefix: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        Self {
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_parse("LOG_JSON", false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            stock_lock_timeout_ms: env_parse("STOCK_LOCK_TIMEOUT_MS", 3000),
            group_sweep_interval_secs: env_parse("GROUP_SWEEP_INTERVAL_SECS", 60),
            free_shipping_threshold: env_parse("FREE_SHIPPING_THRESHOLD", 9900),
            base_shipping_fee: env_parse("BASE_SHIPPING_FEE", 1000),
            order_no_prefix: std::env::var("ORDER_NO_PREFIX").unwrap_or_else(|_| "MO".into()),
        }
    }

    pub fn stock_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.stock_lock_timeout_ms)
    }

    pub fn group_sweep_interval(&self) -> Duration {
        // interval(0) panics
        Duration::from_secs(self.group_sweep_interval_secs.max(1))
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
