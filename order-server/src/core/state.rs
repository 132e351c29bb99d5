//! 服务状态
//!
//! Wires the database, the cache store and the order service together from a
//! [`Config`]. Cloning is cheap; every field is shared.

use std::sync::Arc;

use super::Config;
use crate::cache::{CacheStore, MemoryCacheStore, SummaryCache};
use crate::db::DbService;
use crate::db::repository::reference::SqliteReferenceLookup;
use crate::orders::OrderService;
use crate::pricing::PriceCalculator;
use crate::utils::{AppResult, Clock, SystemClock};

#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub cache_store: Arc<dyn CacheStore>,
    pub orders: Arc<OrderService>,
}

impl ServerState {
    /// 按配置初始化 (system clock)
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.business_timezone));
        Self::initialize_with_clock(config, clock).await
    }

    /// 使用指定时钟初始化
    ///
    /// 测试用 [`crate::utils::ManualClock`] 固定日期与时区
    pub async fn initialize_with_clock(config: &Config, clock: Arc<dyn Clock>) -> AppResult<Self> {
        config.validate()?;

        let db = if config.is_in_memory() {
            DbService::open_in_memory().await?
        } else {
            DbService::new(&config.database_path, config.db_max_connections).await?
        };

        let cache_store: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new());
        let cache = SummaryCache::new(cache_store.clone(), config.cache_ttl());
        let calculator = PriceCalculator::new(Arc::new(SqliteReferenceLookup::new(db.pool.clone())));

        let orders = OrderService::new(
            db.pool.clone(),
            calculator,
            cache,
            clock,
            config.request_timeout(),
        );

        tracing::info!(
            database = %config.database_path,
            cache_ttl_secs = config.cache_ttl_secs,
            timezone = %config.business_timezone,
            "Server state initialized"
        );

        Ok(Self {
            config: config.clone(),
            db,
            cache_store,
            orders: Arc::new(orders),
        })
    }

    pub fn orders(&self) -> &OrderService {
        &self.orders
    }

    pub async fn shutdown(&self) {
        self.db.close().await;
        tracing::info!("Database pool closed");
    }
}
