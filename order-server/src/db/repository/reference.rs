//! Reference Data Repository
//!
//! Read-only lookups of the priced catalogue tables. The tables are administered
//! elsewhere; pricing reaches them only through [`ReferenceLookup`].

use super::RepoResult;
use async_trait::async_trait;
use shared::models::{ItemType, PricedItem};
use sqlx::SqlitePool;

/// Priced component lookup, scoped by tenant
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// `None` when the id does not resolve for the tenant (or is soft-deleted)
    async fn find(
        &self,
        kind: ItemType,
        project_id: i64,
        id: i64,
    ) -> RepoResult<Option<PricedItem>>;
}

fn table_for(kind: ItemType) -> &'static str {
    match kind {
        ItemType::Device => "devices",
        ItemType::Product => "products",
        ItemType::Installation => "installations",
        ItemType::Room => "rooms",
        ItemType::Aging => "agings",
    }
}

pub async fn find_priced_item(
    pool: &SqlitePool,
    kind: ItemType,
    project_id: i64,
    id: i64,
) -> RepoResult<Option<PricedItem>> {
    let sql = format!(
        "SELECT id, name, price FROM {} WHERE id = ? AND project_id = ? AND deleted_at IS NULL",
        table_for(kind)
    );
    let item = sqlx::query_as::<_, PricedItem>(&sql)
        .bind(id)
        .bind(project_id)
        .fetch_optional(pool)
        .await?;
    Ok(item)
}

/// [`ReferenceLookup`] backed by the local SQLite tables
#[derive(Clone)]
pub struct SqliteReferenceLookup {
    pool: SqlitePool,
}

impl SqliteReferenceLookup {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceLookup for SqliteReferenceLookup {
    async fn find(
        &self,
        kind: ItemType,
        project_id: i64,
        id: i64,
    ) -> RepoResult<Option<PricedItem>> {
        find_priced_item(&self.pool, kind, project_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    #[tokio::test]
    async fn test_lookup_is_tenant_scoped() {
        let db = DbService::open_in_memory().await.unwrap();
        sqlx::query("INSERT INTO devices (id, project_id, name, price) VALUES (1, 1, 'Panel', 100000)")
            .execute(&db.pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO devices (id, project_id, name, price, deleted_at) VALUES (2, 1, 'Old', 5, 10)")
            .execute(&db.pool)
            .await
            .unwrap();

        let lookup = SqliteReferenceLookup::new(db.pool.clone());
        let found = lookup.find(ItemType::Device, 1, 1).await.unwrap();
        assert_eq!(found, Some(PricedItem::new(1, "Panel", 100000.0)));

        assert!(lookup.find(ItemType::Device, 2, 1).await.unwrap().is_none());
        assert!(lookup.find(ItemType::Device, 1, 2).await.unwrap().is_none());
        assert!(lookup.find(ItemType::Room, 1, 1).await.unwrap().is_none());
    }
}
