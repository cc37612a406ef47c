//! Dining Table Repository (read-only lookups)

use super::{RepoError, RepoResult};
use shared::models::DiningTable;
use sqlx::SqlitePool;

const COLUMNS: &str = "id, client_id, number, kind, available, calls_waiter, asks_for_bill";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<DiningTable>> {
    let sql = format!("SELECT {COLUMNS} FROM dining_table WHERE id = ?");
    let table = sqlx::query_as::<_, DiningTable>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(table)
}

/// Table lookup that fails with `NotFound` when the table is absent
pub async fn get(pool: &SqlitePool, id: i64) -> RepoResult<DiningTable> {
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Table {id}")))
}
