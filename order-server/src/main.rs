use order_server::{ServerState, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 配置, 日志)
    let config = setup_environment()?;
    tracing::info!("Order server starting (env: {})", config.environment);

    // 2. 初始化服务状态 (数据库、迁移、缓存)
    let state = ServerState::initialize(&config).await?;
    tracing::info!(
        database = %config.database_path,
        "Order pipeline ready, waiting for shutdown signal"
    );

    // 3. 等待退出信号
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    state.shutdown().await;

    Ok(())
}
