//! Order Detail Repository
//!
//! Detail rows are never edited in place: an order save deletes the live set
//! and inserts the freshly computed one.

use super::{RepoResult, WriteContext};
use crate::db::statement::{AuditTrail, SqlStatement, execute_audited};
use shared::models::{OrderDetail, OrderDetailDraft};
use sqlx::{SqliteConnection, SqlitePool};

const TABLE: &str = "order_details";

/// `status` of a live detail row
pub const DETAIL_ACTIVE: i64 = 1;
/// `status` of a soft-deleted detail row
pub const DETAIL_DELETED: i64 = 0;

pub async fn find_by_order(
    pool: &SqlitePool,
    project_id: i64,
    order_id: i64,
) -> RepoResult<Vec<OrderDetail>> {
    let rows = sqlx::query_as::<_, OrderDetail>(
        "SELECT id, order_id, item_type, item_id, description, amount, quantity, status, project_id, created_at, created_by, updated_at, last_update_by, deleted_at FROM order_details WHERE order_id = ? AND project_id = ? AND deleted_at IS NULL ORDER BY id",
    )
    .bind(order_id)
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// One multi-row INSERT for the whole set
///
/// `owner` is the parent order's creator; details always carry it in
/// `created_by`, whoever performs the write.
pub fn insert_statement(
    ctx: &WriteContext<'_>,
    order_id: i64,
    owner: &str,
    drafts: &[OrderDetailDraft],
) -> SqlStatement {
    let placeholders = vec!["(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"; drafts.len()].join(", ");
    let mut stmt = SqlStatement::new(
        TABLE,
        format!(
            "INSERT INTO order_details (order_id, item_type, item_id, description, amount, quantity, status, project_id, created_at, created_by, updated_at, last_update_by) VALUES {placeholders}"
        ),
    );
    for draft in drafts {
        stmt = stmt
            .bind(order_id)
            .bind(draft.item_type.as_str())
            .bind(draft.item_id)
            .bind(draft.description.as_str())
            .bind(draft.amount)
            .bind(draft.quantity)
            .bind(DETAIL_ACTIVE)
            .bind(ctx.project_id)
            .bind(ctx.now)
            .bind(owner)
            .bind(ctx.now)
            .bind(ctx.actor_id);
    }
    stmt
}

pub async fn insert_all(
    conn: &mut SqliteConnection,
    ctx: &WriteContext<'_>,
    order_id: i64,
    owner: &str,
    drafts: &[OrderDetailDraft],
    trail: &mut AuditTrail,
) -> RepoResult<()> {
    if drafts.is_empty() {
        return Ok(());
    }
    let stmt = insert_statement(ctx, order_id, owner, drafts);
    execute_audited(conn, &stmt, trail).await?;
    Ok(())
}

/// Retire the live detail set and insert `drafts` in its place
///
/// Superseded rows are soft-deleted, not removed, so earlier snapshots stay
/// readable next to their audit records.
pub async fn replace_all(
    conn: &mut SqliteConnection,
    ctx: &WriteContext<'_>,
    order_id: i64,
    owner: &str,
    drafts: &[OrderDetailDraft],
    trail: &mut AuditTrail,
) -> RepoResult<()> {
    let retire = SqlStatement::new(
        TABLE,
        "UPDATE order_details SET status = ?, deleted_at = ?, updated_at = ?, last_update_by = ? WHERE order_id = ? AND project_id = ? AND deleted_at IS NULL",
    )
    .bind(DETAIL_DELETED)
    .bind(ctx.now)
    .bind(ctx.now)
    .bind(ctx.actor_id)
    .bind(order_id)
    .bind(ctx.project_id);
    execute_audited(conn, &retire, trail).await?;

    insert_all(conn, ctx, order_id, owner, drafts, trail).await
}

/// Soft-delete every live detail of an order, ownership-scoped like the parent
pub async fn soft_delete_by_order(
    conn: &mut SqliteConnection,
    ctx: &WriteContext<'_>,
    order_id: i64,
    trail: &mut AuditTrail,
) -> RepoResult<u64> {
    let mut stmt = SqlStatement::new(
        TABLE,
        "UPDATE order_details SET status = ?, deleted_at = ?, updated_at = ?, last_update_by = ? WHERE order_id = ? AND project_id = ? AND deleted_at IS NULL",
    )
    .bind(DETAIL_DELETED)
    .bind(ctx.now)
    .bind(ctx.now)
    .bind(ctx.actor_id)
    .bind(order_id)
    .bind(ctx.project_id);
    if let Some(owner) = ctx.owner {
        stmt = stmt.and_eq("created_by", owner);
    }
    let result = execute_audited(conn, &stmt, trail).await?;
    Ok(result.rows_affected())
}
