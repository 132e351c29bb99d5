//! Order pipeline errors
//!
//! | 变体 | 调用方可恢复 | 说明 |
//! |------|-------------|------|
//! | NotFound | yes | 无匹配行 (wrong id / tenant / owner, or soft-deleted)；新建订单引用的组件不存在 |
//! | Validation | yes | 组件 id 缺失、数量非法、非法状态迁移 |
//! | Conflict | yes | 已有订单引用的组件已不存在，或状态被并发修改 |
//! | Persistence | no | 事务 / 连接失败，超时 |

use thiserror::Error;

use crate::db::repository::RepoError;
use crate::pricing::PricingError;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl OrderError {
    /// Caller-recoverable outcome, as opposed to an operational failure
    pub fn is_expected(&self) -> bool {
        !matches!(self, OrderError::Persistence(_))
    }

    pub fn not_found(order_id: i64) -> Self {
        OrderError::NotFound(format!("order {order_id}"))
    }

    /// Pricing failure while creating an order
    ///
    /// A new order cannot conflict with anything yet, so an unknown component
    /// is NotFound. Every other case maps as in `From<PricingError>`.
    pub fn from_create_pricing(err: PricingError) -> Self {
        match err {
            PricingError::ComponentNotFound { .. } => OrderError::NotFound(err.to_string()),
            other => other.into(),
        }
    }
}

impl From<RepoError> for OrderError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => OrderError::NotFound(msg),
            RepoError::Validation(msg) => OrderError::Validation(msg),
            RepoError::Duplicate(msg) | RepoError::Conflict(msg) => OrderError::Conflict(msg),
            RepoError::Database(msg) => OrderError::Persistence(msg),
        }
    }
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        RepoError::from(err).into()
    }
}

impl From<PricingError> for OrderError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::ComponentNotFound { .. } => OrderError::Conflict(err.to_string()),
            PricingError::Invalid(msg) => OrderError::Validation(msg),
            PricingError::Lookup(repo) => repo.into(),
        }
    }
}

pub type OrderResult<T> = Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::ItemType;

    #[test]
    fn test_expected_vs_operational() {
        assert!(OrderError::not_found(7).is_expected());
        assert!(OrderError::Validation("x".into()).is_expected());
        assert!(OrderError::Conflict("x".into()).is_expected());
        assert!(!OrderError::Persistence("x".into()).is_expected());
    }

    #[test]
    fn test_missing_component_is_conflict() {
        let err: OrderError = PricingError::ComponentNotFound {
            kind: ItemType::Room,
            id: 4,
        }
        .into();
        assert!(matches!(err, OrderError::Conflict(_)));
    }

    #[test]
    fn test_missing_component_on_create_is_not_found() {
        let err = OrderError::from_create_pricing(PricingError::ComponentNotFound {
            kind: ItemType::Aging,
            id: 99,
        });
        assert!(matches!(err, OrderError::NotFound(ref msg) if msg.contains("99")));

        let err = OrderError::from_create_pricing(PricingError::Invalid("room_quantity".into()));
        assert!(matches!(err, OrderError::Validation(_)));
        let err = OrderError::from_create_pricing(PricingError::Lookup(RepoError::Database(
            "disk I/O".into(),
        )));
        assert!(matches!(err, OrderError::Persistence(_)));
    }

    #[test]
    fn test_repo_mapping() {
        let err: OrderError = RepoError::Database("disk I/O".into()).into();
        assert!(matches!(err, OrderError::Persistence(_)));
        let err: OrderError = RepoError::Duplicate("order_number".into()).into();
        assert!(matches!(err, OrderError::Conflict(_)));
    }
}
