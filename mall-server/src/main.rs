use std::time::Duration;

use mall_server::{BackgroundTasks, ServerState, setup_environment};

/// 关机时每个后台任务的等待上限
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 环境 (dotenv, 配置, 日志)
    let config = setup_environment();

    tracing::info!(
        environment = %config.environment,
        stock_lock_timeout_ms = config.stock_lock_timeout_ms,
        group_sweep_interval_secs = config.group_sweep_interval_secs,
        "Mall server starting"
    );

    // 2. 装配服务
    let (state, _store) = ServerState::in_memory(config);

    // 3. 后台任务
    let mut tasks = BackgroundTasks::new();
    state.start_background_tasks(&mut tasks);
    tasks.log_summary();

    // 4. 等待 Ctrl-C
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    tasks.shutdown(SHUTDOWN_GRACE).await;
    Ok(())
}
