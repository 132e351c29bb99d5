//! Repository Module
//!
//! Free async functions over SQLite. Reads take `&SqlitePool`; writes take the
//! transaction's `&mut SqliteConnection` so that order, details and audit rows
//! commit together.

// Orders
pub mod order;
pub mod order_detail;
pub mod order_sequence;

// Read-only collaborators
pub mod reference;
pub mod summary;

// Audit
pub mod audit_log;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Row exists but no longer matches the state the write was planned on
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row not found".into()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepoError::Duplicate(db_err.message().to_string())
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Attribution and scope of one write
#[derive(Debug, Clone, Copy)]
pub struct WriteContext<'a> {
    pub project_id: i64,
    /// Recorded in `last_update_by` (and `created_by` on insert)
    pub actor_id: &'a str,
    /// Ownership filter: `Some(user)` adds `AND created_by = user`
    pub owner: Option<&'a str>,
    pub now: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    #[tokio::test]
    async fn test_unique_violation_maps_to_duplicate() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE t (k TEXT PRIMARY KEY)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO t (k) VALUES ('a')")
            .execute(&pool)
            .await
            .unwrap();
        let err: RepoError = sqlx::query("INSERT INTO t (k) VALUES ('a')")
            .execute(&pool)
            .await
            .unwrap_err()
            .into();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: RepoError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, RepoError::NotFound(_)));
    }
}
