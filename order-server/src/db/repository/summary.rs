//! Summary Repository
//!
//! Read-only projections joining orders with venues, licenses and companies.
//! The optional owner filter narrows the joined orders, not the venue/license
//! row itself.

use super::RepoResult;
use shared::models::{LicenseSummary, SummaryOrder, VenueSummary};
use sqlx::{Sqlite, SqlitePool};

fn owner_clause(owner: Option<&str>) -> &'static str {
    if owner.is_some() {
        " AND o.created_by = ?"
    } else {
        ""
    }
}

pub async fn find_venue_summary(
    pool: &SqlitePool,
    project_id: i64,
    venue_id: i64,
    owner: Option<&str>,
) -> RepoResult<Option<VenueSummary>> {
    let sql = format!(
        "SELECT v.id AS venue_id, v.name AS venue_name, v.license_id, l.name AS license_name, \
         c.id AS company_id, c.name AS company_name, \
         COUNT(o.order_id) AS order_count, \
         COALESCE(SUM(CASE WHEN o.status = 2 THEN 1 ELSE 0 END), 0) AS paid_count, \
         CAST(COALESCE(SUM(o.total_price), 0) AS REAL) AS total_amount, \
         CAST(COALESCE(SUM(CASE WHEN o.status = 2 THEN o.total_price ELSE 0 END), 0) AS REAL) AS paid_amount, \
         MAX(o.paid_at) AS last_paid_at \
         FROM venues v \
         LEFT JOIN licenses l ON l.id = v.license_id AND l.deleted_at IS NULL \
         LEFT JOIN companies c ON c.id = l.company_id AND c.deleted_at IS NULL \
         LEFT JOIN orders o ON o.venue_id = v.id AND o.project_id = v.project_id AND o.deleted_at IS NULL{} \
         WHERE v.id = ? AND v.project_id = ? AND v.deleted_at IS NULL \
         GROUP BY v.id",
        owner_clause(owner)
    );
    let mut query = sqlx::query_as::<_, VenueSummary>(&sql);
    if let Some(owner) = owner {
        query = query.bind(owner);
    }
    let summary = query
        .bind(venue_id)
        .bind(project_id)
        .fetch_optional(pool)
        .await?;
    Ok(summary)
}

pub async fn find_license_summary(
    pool: &SqlitePool,
    project_id: i64,
    license_id: i64,
    owner: Option<&str>,
) -> RepoResult<Option<LicenseSummary>> {
    let sql = format!(
        "SELECT l.id AS license_id, l.name AS license_name, c.name AS company_name, \
         COUNT(DISTINCT v.id) AS venue_count, \
         COUNT(o.order_id) AS order_count, \
         COALESCE(SUM(CASE WHEN o.status = 2 THEN 1 ELSE 0 END), 0) AS paid_count, \
         CAST(COALESCE(SUM(CASE WHEN o.status = 2 THEN o.total_price ELSE 0 END), 0) AS REAL) AS paid_amount \
         FROM licenses l \
         LEFT JOIN companies c ON c.id = l.company_id AND c.deleted_at IS NULL \
         LEFT JOIN venues v ON v.license_id = l.id AND v.project_id = l.project_id AND v.deleted_at IS NULL \
         LEFT JOIN orders o ON o.venue_id = v.id AND o.project_id = l.project_id AND o.deleted_at IS NULL{} \
         WHERE l.id = ? AND l.project_id = ? AND l.deleted_at IS NULL \
         GROUP BY l.id",
        owner_clause(owner)
    );
    let mut query = sqlx::query_as::<_, LicenseSummary>(&sql);
    if let Some(owner) = owner {
        query = query.bind(owner);
    }
    let summary = query
        .bind(license_id)
        .bind(project_id)
        .fetch_optional(pool)
        .await?;
    Ok(summary)
}

/// Live orders of every venue under a license, newest first
pub async fn find_license_orders(
    pool: &SqlitePool,
    project_id: i64,
    license_id: i64,
    owner: Option<&str>,
) -> RepoResult<Vec<SummaryOrder>> {
    let sql = format!(
        "SELECT o.order_id, o.order_number, o.status, o.total_price, o.buyer_id, o.venue_id, \
         v.name AS venue_name, c.name AS company_name, \
         (SELECT COUNT(*) FROM order_details d WHERE d.order_id = o.order_id AND d.deleted_at IS NULL) AS item_count, \
         o.paid_at \
         FROM orders o \
         JOIN venues v ON v.id = o.venue_id AND v.project_id = o.project_id \
         JOIN licenses l ON l.id = v.license_id \
         LEFT JOIN companies c ON c.id = l.company_id \
         WHERE l.id = ? AND o.project_id = ? AND o.deleted_at IS NULL{} \
         ORDER BY o.order_id DESC",
        owner_clause(owner)
    );
    let mut query = sqlx::query_as::<_, SummaryOrder>(&sql)
        .bind(license_id)
        .bind(project_id);
    if let Some(owner) = owner {
        query = query.bind(owner);
    }
    Ok(query.fetch_all(pool).await?)
}

/// License of a venue, if any (soft-deleted venues included)
pub async fn find_venue_license(
    executor: impl sqlx::Executor<'_, Database = Sqlite>,
    project_id: i64,
    venue_id: i64,
) -> RepoResult<Option<i64>> {
    let license_id = sqlx::query_scalar::<_, Option<i64>>(
        "SELECT license_id FROM venues WHERE id = ? AND project_id = ?",
    )
    .bind(venue_id)
    .bind(project_id)
    .fetch_optional(executor)
    .await?;
    Ok(license_id.flatten())
}
