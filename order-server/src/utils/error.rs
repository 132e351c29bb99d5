//! 统一错误处理 (boot / infrastructure level)
//!
//! Order pipeline outcomes use [`crate::orders::OrderError`]; this type covers
//! everything that can go wrong while bringing the process up:
//!
//! | 分类 | 说明 |
//! |------|------|
//! | Config | 配置值无效 |
//! | Database | 打开数据库、迁移失败 |

/// Application-level error
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    /// 配置错误
    Config(String),

    #[error("Database error: {0}")]
    /// 数据库错误
    Database(String),
}

// ========== Helper Constructors ==========

impl AppError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

/// Application-level Result type
pub type AppResult<T> = Result<T, AppError>;
