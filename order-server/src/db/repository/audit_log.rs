//! Audit Log Repository (`logs`, append-only)

use super::RepoResult;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

/// One row of `logs`
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLogEntry {
    pub id: i64,
    pub user_id: String,
    pub query_executed: String,
    pub table_name: String,
    pub project_id: i64,
    pub timestamp: i64,
}

pub async fn insert(
    conn: &mut SqliteConnection,
    user_id: &str,
    query_executed: &str,
    table_name: &str,
    project_id: i64,
    timestamp: i64,
) -> RepoResult<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO logs (user_id, query_executed, table_name, project_id, timestamp) VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(user_id)
    .bind(query_executed)
    .bind(table_name)
    .bind(project_id)
    .bind(timestamp)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

/// Audit rows for a tenant, oldest first
pub async fn find_by_project(pool: &SqlitePool, project_id: i64) -> RepoResult<Vec<AuditLogEntry>> {
    let rows = sqlx::query_as::<_, AuditLogEntry>(
        "SELECT id, user_id, query_executed, table_name, project_id, timestamp FROM logs WHERE project_id = ? ORDER BY id",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
