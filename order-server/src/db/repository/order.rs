//! Order Repository
//!
//! Reads exclude soft-deleted rows. Every query takes an optional owner filter
//! (`created_by = ?`) produced by the caller's ownership policy.

use super::{RepoError, RepoResult, WriteContext};
use crate::db::statement::{AuditTrail, SqlStatement, execute_audited};
use crate::orders::state_machine::StatusChange;
use shared::models::{Order, OrderCreate, OrderStatus};
use sqlx::{Sqlite, SqliteConnection, SqlitePool};

const TABLE: &str = "orders";

const ORDER_COLUMNS: &str = "order_id, order_number, buyer_id, venue_id, device_id, product_id, installation_id, quantity, aging_id, room_id, room_quantity, total_price, payment_method_id, payment_fee, status, email, open_payment_status, project_id, created_at, created_by, updated_at, last_update_by, deleted_at, pending_at, paid_at, failed_at";

/// Live-row filter shared by every read
fn select_sql(filter: &str, owner: Option<&str>, order_by: &str) -> String {
    let mut sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE project_id = ? AND deleted_at IS NULL{filter}"
    );
    if owner.is_some() {
        sql.push_str(" AND created_by = ?");
    }
    sql.push_str(order_by);
    sql
}

// =============================================================================
// Reads
// =============================================================================

pub async fn find_by_id(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
    project_id: i64,
    order_id: i64,
    owner: Option<&str>,
) -> RepoResult<Option<Order>> {
    let sql = select_sql(" AND order_id = ?", owner, "");
    let mut query = sqlx::query_as::<_, Order>(&sql).bind(project_id).bind(order_id);
    if let Some(owner) = owner {
        query = query.bind(owner);
    }
    let order = query.fetch_optional(executor).await?;
    Ok(order)
}

/// Orders of a tenant, optionally narrowed to one status, newest first
pub async fn find_all(
    pool: &SqlitePool,
    project_id: i64,
    status: Option<OrderStatus>,
    owner: Option<&str>,
) -> RepoResult<Vec<Order>> {
    let filter = if status.is_some() { " AND status = ?" } else { "" };
    let sql = select_sql(filter, owner, " ORDER BY order_id DESC");
    let mut query = sqlx::query_as::<_, Order>(&sql).bind(project_id);
    if let Some(status) = status {
        query = query.bind(status);
    }
    if let Some(owner) = owner {
        query = query.bind(owner);
    }
    Ok(query.fetch_all(pool).await?)
}

pub async fn find_by_venue(
    pool: &SqlitePool,
    project_id: i64,
    venue_id: i64,
    owner: Option<&str>,
) -> RepoResult<Vec<Order>> {
    let sql = select_sql(" AND venue_id = ?", owner, " ORDER BY order_id DESC");
    let mut query = sqlx::query_as::<_, Order>(&sql).bind(project_id).bind(venue_id);
    if let Some(owner) = owner {
        query = query.bind(owner);
    }
    Ok(query.fetch_all(pool).await?)
}

pub async fn find_by_buyer(
    pool: &SqlitePool,
    project_id: i64,
    buyer_id: &str,
    owner: Option<&str>,
) -> RepoResult<Vec<Order>> {
    let sql = select_sql(" AND buyer_id = ?", owner, " ORDER BY order_id DESC");
    let mut query = sqlx::query_as::<_, Order>(&sql).bind(project_id).bind(buyer_id);
    if let Some(owner) = owner {
        query = query.bind(owner);
    }
    Ok(query.fetch_all(pool).await?)
}

/// Orders paid within `[start, end)` (Unix millis), oldest payment first
pub async fn find_paid_between(
    pool: &SqlitePool,
    project_id: i64,
    start: i64,
    end: i64,
    owner: Option<&str>,
) -> RepoResult<Vec<Order>> {
    let sql = select_sql(
        " AND status = ? AND paid_at >= ? AND paid_at < ?",
        owner,
        " ORDER BY paid_at, order_id",
    );
    let mut query = sqlx::query_as::<_, Order>(&sql)
        .bind(project_id)
        .bind(OrderStatus::Paid)
        .bind(start)
        .bind(end);
    if let Some(owner) = owner {
        query = query.bind(owner);
    }
    Ok(query.fetch_all(pool).await?)
}

// =============================================================================
// Writes (audited, on the caller's transaction)
// =============================================================================

pub fn insert_statement(
    ctx: &WriteContext<'_>,
    order_number: &str,
    data: &OrderCreate,
    total_price: f64,
) -> SqlStatement {
    SqlStatement::new(
        TABLE,
        "INSERT INTO orders (order_number, buyer_id, venue_id, device_id, product_id, installation_id, quantity, aging_id, room_id, room_quantity, total_price, payment_method_id, payment_fee, status, email, project_id, created_at, created_by, updated_at, last_update_by) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(order_number)
    .bind(data.buyer_id.as_str())
    .bind(data.venue_id)
    .bind(data.device_id)
    .bind(data.product_id)
    .bind(data.installation_id)
    .bind(data.quantity)
    .bind(data.aging_id)
    .bind(data.room_id)
    .bind(data.room_quantity)
    .bind(total_price)
    .bind(data.payment_method_id)
    .bind(data.payment_fee)
    .bind(OrderStatus::Created.code())
    .bind(data.email.clone())
    .bind(ctx.project_id)
    .bind(ctx.now)
    .bind(ctx.actor_id)
    .bind(ctx.now)
    .bind(ctx.actor_id)
}

/// Insert a new order (status Created, no lifecycle stamps), returning its id
pub async fn insert(
    conn: &mut SqliteConnection,
    ctx: &WriteContext<'_>,
    order_number: &str,
    data: &OrderCreate,
    total_price: f64,
    trail: &mut AuditTrail,
) -> RepoResult<i64> {
    let stmt = insert_statement(ctx, order_number, data, total_price);
    let result = execute_audited(conn, &stmt, trail).await?;
    Ok(result.last_insert_rowid())
}

/// Full attribute update, guarded on the status observed before the call
pub fn update_statement(
    ctx: &WriteContext<'_>,
    order_id: i64,
    data: &OrderCreate,
    total_price: f64,
    change: &StatusChange,
) -> SqlStatement {
    let stmt = SqlStatement::new(
        TABLE,
        "UPDATE orders SET buyer_id = ?, venue_id = ?, device_id = ?, product_id = ?, installation_id = ?, quantity = ?, aging_id = ?, room_id = ?, room_quantity = ?, total_price = ?, payment_method_id = ?, payment_fee = ?, email = ?, status = ?, open_payment_status = COALESCE(?, open_payment_status), pending_at = COALESCE(pending_at, ?), paid_at = COALESCE(paid_at, ?), failed_at = COALESCE(failed_at, ?), updated_at = ?, last_update_by = ? WHERE order_id = ? AND project_id = ? AND deleted_at IS NULL AND status = ?",
    )
    .bind(data.buyer_id.as_str())
    .bind(data.venue_id)
    .bind(data.device_id)
    .bind(data.product_id)
    .bind(data.installation_id)
    .bind(data.quantity)
    .bind(data.aging_id)
    .bind(data.room_id)
    .bind(data.room_quantity)
    .bind(total_price)
    .bind(data.payment_method_id)
    .bind(data.payment_fee)
    .bind(data.email.clone())
    .bind(change.target.code())
    .bind(change.open_payment_status.clone())
    .bind(change.stamps.pending_at)
    .bind(change.stamps.paid_at)
    .bind(change.stamps.failed_at)
    .bind(ctx.now)
    .bind(ctx.actor_id)
    .bind(order_id)
    .bind(ctx.project_id)
    .bind(change.observed.code());
    with_owner(stmt, ctx.owner)
}

/// Status-only transition, guarded on the observed status
pub fn update_status_statement(
    ctx: &WriteContext<'_>,
    order_id: i64,
    change: &StatusChange,
) -> SqlStatement {
    let stmt = SqlStatement::new(
        TABLE,
        "UPDATE orders SET status = ?, open_payment_status = COALESCE(?, open_payment_status), pending_at = COALESCE(pending_at, ?), paid_at = COALESCE(paid_at, ?), failed_at = COALESCE(failed_at, ?), updated_at = ?, last_update_by = ? WHERE order_id = ? AND project_id = ? AND deleted_at IS NULL AND status = ?",
    )
    .bind(change.target.code())
    .bind(change.open_payment_status.clone())
    .bind(change.stamps.pending_at)
    .bind(change.stamps.paid_at)
    .bind(change.stamps.failed_at)
    .bind(ctx.now)
    .bind(ctx.actor_id)
    .bind(order_id)
    .bind(ctx.project_id)
    .bind(change.observed.code());
    with_owner(stmt, ctx.owner)
}

pub fn soft_delete_statement(ctx: &WriteContext<'_>, order_id: i64) -> SqlStatement {
    let stmt = SqlStatement::new(
        TABLE,
        "UPDATE orders SET deleted_at = ?, updated_at = ?, last_update_by = ? WHERE order_id = ? AND project_id = ? AND deleted_at IS NULL",
    )
    .bind(ctx.now)
    .bind(ctx.now)
    .bind(ctx.actor_id)
    .bind(order_id)
    .bind(ctx.project_id);
    with_owner(stmt, ctx.owner)
}

fn with_owner(stmt: SqlStatement, owner: Option<&str>) -> SqlStatement {
    match owner {
        Some(owner) => stmt.and_eq("created_by", owner),
        None => stmt,
    }
}

/// Run a status-guarded UPDATE
///
/// Zero rows is resolved by re-reading on the same connection: row still
/// visible → Conflict (status moved underneath us), otherwise NotFound.
pub async fn execute_guarded(
    conn: &mut SqliteConnection,
    ctx: &WriteContext<'_>,
    order_id: i64,
    stmt: &SqlStatement,
    trail: &mut AuditTrail,
) -> RepoResult<()> {
    let result = execute_audited(conn, stmt, trail).await?;
    if result.rows_affected() > 0 {
        return Ok(());
    }

    match find_by_id(&mut *conn, ctx.project_id, order_id, ctx.owner).await? {
        Some(current) => Err(RepoError::Conflict(format!(
            "order {order_id} changed concurrently (now {})",
            current.status
        ))),
        None => Err(RepoError::NotFound(format!("order {order_id}"))),
    }
}

/// Soft-delete; NotFound when no live row matches id/tenant/owner
pub async fn soft_delete(
    conn: &mut SqliteConnection,
    ctx: &WriteContext<'_>,
    order_id: i64,
    trail: &mut AuditTrail,
) -> RepoResult<()> {
    let stmt = soft_delete_statement(ctx, order_id);
    let result = execute_audited(conn, &stmt, trail).await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("order {order_id}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    fn create_payload() -> OrderCreate {
        OrderCreate {
            buyer_id: "u1".into(),
            venue_id: 3,
            device_id: 1,
            product_id: 1,
            installation_id: 1,
            room_id: 1,
            room_quantity: 4,
            aging_id: 1,
            quantity: 1,
            payment_method_id: None,
            payment_fee: 0.0,
            email: None,
        }
    }

    fn ctx<'a>(actor: &'a str, owner: Option<&'a str>) -> WriteContext<'a> {
        WriteContext {
            project_id: 1,
            actor_id: actor,
            owner,
            now: 1000,
        }
    }

    async fn seed_order(pool: &SqlitePool, number: &str, creator: &str) -> i64 {
        let mut tx = pool.begin().await.unwrap();
        let mut trail = AuditTrail::new(creator, 1, 1000);
        let id = insert(
            &mut tx,
            &ctx(creator, None),
            number,
            &create_payload(),
            240000.0,
            &mut trail,
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let db = DbService::open_in_memory().await.unwrap();
        let id = seed_order(&db.pool, "MN23100500000001", "u1").await;

        let order = find_by_id(&db.pool, 1, id, None).await.unwrap().unwrap();
        assert_eq!(order.order_number, "MN23100500000001");
        assert_eq!(order.status, OrderStatus::Created);
        assert_eq!(order.total_price, 240000.0);
        assert!(order.pending_at.is_none() && order.paid_at.is_none() && order.failed_at.is_none());

        assert!(find_by_id(&db.pool, 1, id, Some("u2")).await.unwrap().is_none());
        assert!(find_by_id(&db.pool, 2, id, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_order_number_rejected() {
        let db = DbService::open_in_memory().await.unwrap();
        seed_order(&db.pool, "MN23100500000001", "u1").await;

        let mut tx = db.pool.begin().await.unwrap();
        let mut trail = AuditTrail::new("u1", 1, 1000);
        let err = insert(
            &mut tx,
            &ctx("u1", None),
            "MN23100500000001",
            &create_payload(),
            1.0,
            &mut trail,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_status_guard_and_stamps() {
        let db = DbService::open_in_memory().await.unwrap();
        let id = seed_order(&db.pool, "MN23100500000001", "u1").await;

        let mut tx = db.pool.begin().await.unwrap();
        let mut trail = AuditTrail::new("u1", 1, 2000);
        let write = ctx("u1", Some("u1"));
        let change = StatusChange::plan(
            OrderStatus::Created,
            OrderStatus::Paid,
            Some("AUTHORISED".into()),
            2000,
        )
        .unwrap();
        let stmt = update_status_statement(&write, id, &change);
        execute_guarded(&mut tx, &write, id, &stmt, &mut trail)
            .await
            .unwrap();

        // Stale observed status: the row is there but no longer Created
        let stale_change =
            StatusChange::plan(OrderStatus::Created, OrderStatus::Failed, None, 3000).unwrap();
        let stale = update_status_statement(&write, id, &stale_change);
        let err = execute_guarded(&mut tx, &write, id, &stale, &mut trail)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
        tx.commit().await.unwrap();

        let order = find_by_id(&db.pool, 1, id, None).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.paid_at, Some(2000));
        assert_eq!(order.failed_at, None);
        assert_eq!(order.open_payment_status.as_deref(), Some("AUTHORISED"));
    }

    #[tokio::test]
    async fn test_soft_delete_respects_owner() {
        let db = DbService::open_in_memory().await.unwrap();
        let id = seed_order(&db.pool, "MN23100500000001", "u1").await;

        let mut tx = db.pool.begin().await.unwrap();
        let mut trail = AuditTrail::new("u2", 1, 2000);
        let err = soft_delete(&mut tx, &ctx("u2", Some("u2")), id, &mut trail)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));

        soft_delete(&mut tx, &ctx("admin", None), id, &mut trail)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert!(find_by_id(&db.pool, 1, id, None).await.unwrap().is_none());
        assert!(find_all(&db.pool, 1, None, None).await.unwrap().is_empty());
        let raw: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(raw, 1);
    }

    #[tokio::test]
    async fn test_filtered_reads() {
        let db = DbService::open_in_memory().await.unwrap();
        seed_order(&db.pool, "MN23100500000001", "u1").await;
        seed_order(&db.pool, "MN23100500000002", "u2").await;

        assert_eq!(find_all(&db.pool, 1, None, None).await.unwrap().len(), 2);
        assert_eq!(find_all(&db.pool, 1, None, Some("u2")).await.unwrap().len(), 1);
        assert_eq!(
            find_all(&db.pool, 1, Some(OrderStatus::Paid), None)
                .await
                .unwrap()
                .len(),
            0
        );
        assert_eq!(find_by_venue(&db.pool, 1, 3, None).await.unwrap().len(), 2);
        assert_eq!(find_by_buyer(&db.pool, 1, "u1", None).await.unwrap().len(), 2);
        assert!(
            find_paid_between(&db.pool, 1, 0, i64::MAX, None)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
