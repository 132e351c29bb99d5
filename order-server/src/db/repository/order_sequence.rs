//! Order Sequence Repository
//!
//! `order_sequence` keeps one counter per business day (`YYMMDD`). All
//! functions run on the caller's transaction connection.

use super::RepoResult;
use sqlx::SqliteConnection;

/// Make sure the day's row exists
///
/// Returns `true` when this call created it (counter starts at 0). The INSERT
/// takes the write lock, so whoever creates the row can seed it race-free.
pub async fn ensure_day(conn: &mut SqliteConnection, seq_date: &str) -> RepoResult<bool> {
    let rows = sqlx::query(
        "INSERT INTO order_sequence (seq_date, counter) VALUES (?, 0) ON CONFLICT(seq_date) DO NOTHING",
    )
    .bind(seq_date)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Overwrite the counter of a freshly created day row
pub async fn seed(conn: &mut SqliteConnection, seq_date: &str, counter: i64) -> RepoResult<()> {
    sqlx::query("UPDATE order_sequence SET counter = ? WHERE seq_date = ?")
        .bind(counter)
        .bind(seq_date)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Atomically increment and return the new counter
pub async fn increment(conn: &mut SqliteConnection, seq_date: &str) -> RepoResult<i64> {
    let counter = sqlx::query_scalar::<_, i64>(
        "UPDATE order_sequence SET counter = counter + 1 WHERE seq_date = ? RETURNING counter",
    )
    .bind(seq_date)
    .fetch_one(&mut *conn)
    .await?;
    Ok(counter)
}

/// Order number of the most recently inserted order, system-wide
///
/// Soft-deleted orders count: their numbers stay taken.
pub async fn find_last_order_number(conn: &mut SqliteConnection) -> RepoResult<Option<String>> {
    let number = sqlx::query_scalar::<_, String>(
        "SELECT order_number FROM orders ORDER BY order_id DESC LIMIT 1",
    )
    .fetch_optional(&mut *conn)
    .await?;
    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    #[tokio::test]
    async fn test_ensure_day_only_creates_once() {
        let db = DbService::open_in_memory().await.unwrap();
        let mut conn = db.pool.acquire().await.unwrap();

        assert!(ensure_day(&mut conn, "231005").await.unwrap());
        assert!(!ensure_day(&mut conn, "231005").await.unwrap());
        assert!(ensure_day(&mut conn, "231006").await.unwrap());
    }

    #[tokio::test]
    async fn test_increment_after_seed() {
        let db = DbService::open_in_memory().await.unwrap();
        let mut conn = db.pool.acquire().await.unwrap();

        ensure_day(&mut conn, "231005").await.unwrap();
        seed(&mut conn, "231005", 41).await.unwrap();
        assert_eq!(increment(&mut conn, "231005").await.unwrap(), 42);
        assert_eq!(increment(&mut conn, "231005").await.unwrap(), 43);
    }

    #[tokio::test]
    async fn test_last_order_number_empty() {
        let db = DbService::open_in_memory().await.unwrap();
        let mut conn = db.pool.acquire().await.unwrap();
        assert_eq!(find_last_order_number(&mut conn).await.unwrap(), None);
    }
}
