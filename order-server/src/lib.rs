//! Order Server - 订单流水线
//!
//! # 架构概述
//!
//! - **定价** (`pricing`): 组件解析 + 总价计算 (rust_decimal)
//! - **订单** (`orders`): 订单号、状态机、明细快照、事务写入
//! - **数据库** (`db`): SQLite (sqlx)，审计与写入同事务
//! - **缓存** (`cache`): cache-aside 读模型与失效依赖图
//!
//! # 模块结构
//!
//! ```text
//! order-server/src/
//! ├── core/          # 配置、状态
//! ├── db/            # 连接池、迁移、仓储
//! ├── pricing/       # 价格计算
//! ├── orders/        # 订单服务
//! ├── cache/         # 摘要缓存
//! └── utils/         # 错误、日志、时间、校验
//! ```

pub mod cache;
pub mod core;
pub mod db;
pub mod orders;
pub mod pricing;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, ServerState};
pub use orders::{Actor, OrderError, OrderResult, OrderService, RequestContext};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger_with_file};

/// 设置环境: 加载 .env，读取配置，初始化日志
///
/// Must be called from within a tokio runtime when `LOG_DIR` is set.
pub fn setup_environment() -> anyhow::Result<Config> {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    init_logger_with_file(&config.log_level, config.log_json, config.log_dir.as_deref())?;
    Ok(config)
}
