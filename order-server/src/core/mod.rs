//! 核心模块 - 配置与服务状态
//!
//! - [`Config`] - 环境配置
//! - [`ServerState`] - 已装配的服务 (数据库、缓存、订单服务)

pub mod config;
pub mod state;

pub use config::Config;
pub use state::ServerState;
