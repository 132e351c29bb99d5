use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

use crate::utils::time::parse_timezone;
use crate::utils::{AppError, AppResult};

/// Special `DATABASE_PATH` value selecting a single-connection in-memory database
pub const IN_MEMORY_DATABASE: &str = ":memory:";

/// 服务配置 - 订单处理节点的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖 (`.env` is loaded first by `setup_environment`):
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 |
/// | DATABASE_PATH | {WORK_DIR}/orders.db | SQLite 文件 (`:memory:` 可用) |
/// | DB_MAX_CONNECTIONS | 5 | 连接池大小 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 日志 |
/// | LOG_DIR | (none) | 日志目录 |
/// | CACHE_TTL_SECS | 300 | 汇总缓存 TTL |
/// | BUSINESS_TIMEZONE | Europe/Madrid | 业务时区 (订单号日期) |
/// | REQUEST_TIMEOUT_MS | 30000 | 单次写事务超时(毫秒) |
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// SQLite 数据库路径
    pub database_path: String,
    /// 连接池最大连接数
    pub db_max_connections: u32,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    /// 缓存 TTL (秒)
    pub cache_ttl_secs: u64,
    /// 业务时区
    pub business_timezone: Tz,
    /// 写事务超时时间 (毫秒)
    pub request_timeout_ms: u64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into());
        let database_path = std::env::var("DATABASE_PATH").unwrap_or_else(|_| {
            PathBuf::from(&work_dir)
                .join("orders.db")
                .to_string_lossy()
                .into_owned()
        });

        Self {
            work_dir,
            database_path,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 5),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            cache_ttl_secs: env_or("CACHE_TTL_SECS", 300),
            business_timezone: parse_timezone(
                &std::env::var("BUSINESS_TIMEZONE").unwrap_or_else(|_| "Europe/Madrid".into()),
            ),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30000),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(
        database_path: impl Into<String>,
        business_timezone: Tz,
        cache_ttl_secs: u64,
    ) -> Self {
        let mut config = Self::from_env();
        config.database_path = database_path.into();
        config.business_timezone = business_timezone;
        config.cache_ttl_secs = cache_ttl_secs;
        config
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path == IN_MEMORY_DATABASE
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// 启动前校验配置
    pub fn validate(&self) -> AppResult<()> {
        if self.database_path.trim().is_empty() {
            return Err(AppError::config("DATABASE_PATH is empty"));
        }
        if self.db_max_connections == 0 {
            return Err(AppError::config("DB_MAX_CONNECTIONS must be at least 1"));
        }
        if self.request_timeout_ms == 0 {
            return Err(AppError::config("REQUEST_TIMEOUT_MS must be positive"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let config = Config::with_overrides(IN_MEMORY_DATABASE, Tz::UTC, 60);
        assert!(config.is_in_memory());
        assert_eq!(config.business_timezone, Tz::UTC);
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_validate_rejects_unusable_values() {
        let config = Config::with_overrides(IN_MEMORY_DATABASE, Tz::UTC, 60);
        assert!(config.validate().is_ok());

        let mut config = Config::with_overrides(IN_MEMORY_DATABASE, Tz::UTC, 60);
        config.db_max_connections = 0;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let mut config = Config::with_overrides(IN_MEMORY_DATABASE, Tz::UTC, 60);
        config.request_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let config = Config::with_overrides(" ", Tz::UTC, 60);
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_env_or_falls_back_on_missing_or_garbage() {
        assert_eq!(env_or("ORDER_SERVER_TEST_UNSET_VARIABLE", 42u32), 42);
    }
}
