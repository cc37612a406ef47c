//! Order aggregate store
//!
//! Thin service over the order, table and dish repositories. Converts
//! repository errors into API errors with resource specific codes.

pub mod grouping;

pub use grouping::group_by_table;

use serde_json::{Map, Value};
use shared::models::{DiningTable, Dish, ItemCreate, Order, OrderCreate, OrderUpdate};
use shared::{AppError, AppResult, ErrorCode};
use sqlx::SqlitePool;

use crate::db::repository::{RepoError, dining_table, dish, order};

#[derive(Clone, Debug)]
pub struct OrderStore {
    pool: SqlitePool,
}

impl OrderStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// CreateOrder
    ///
    /// 桌台不存在时照常创建 (读取时降级为占位桌台)；桌台属于其他客户端时拒绝。
    pub async fn create(&self, data: &OrderCreate) -> AppResult<Order> {
        if let (Some(client_id), Some(table_id)) = (data.client_id, data.resolved_table_id())
            && let Some(table) = dining_table::find_by_id(&self.pool, table_id).await?
            && table.client_id != client_id
        {
            return Err(AppError::table_mismatch(table_id, client_id));
        }

        let order = order::create(&self.pool, data).await?;
        tracing::info!(order_id = order.id, client_id = order.client_id, table_id = order.table_id, "Order created");
        Ok(order)
    }

    /// AddItems, all-or-nothing. Returns the new item ids.
    pub async fn add_items(&self, order_id: i64, items: &[ItemCreate]) -> AppResult<Vec<i64>> {
        let ids = order::add_items(&self.pool, order_id, items)
            .await
            .map_err(not_found_as(ErrorCode::OrderNotFound))?;
        tracing::info!(order_id, count = ids.len(), "Items added to order");
        Ok(ids)
    }

    /// PatchItem (status fields only)
    pub async fn patch_item(&self, item_id: i64, updates: Map<String, Value>) -> AppResult<()> {
        order::patch_item(&self.pool, item_id, updates)
            .await
            .map_err(not_found_as(ErrorCode::OrderItemNotFound))
    }

    /// UpdateOrder (cancel only)
    pub async fn update(&self, order_id: i64, data: &OrderUpdate) -> AppResult<()> {
        order::update(&self.pool, order_id, data)
            .await
            .map_err(not_found_as(ErrorCode::OrderNotFound))?;
        if let Some(canceled) = data.canceled {
            tracing::info!(order_id, canceled, "Order updated");
        }
        Ok(())
    }

    /// GetByID
    pub async fn get_by_id(&self, order_id: i64) -> AppResult<Order> {
        Ok(order::find_by_id(&self.pool, order_id).await?)
    }

    /// Order row without items, used to check ownership before mutations
    pub async fn get_header(&self, order_id: i64) -> AppResult<Order> {
        order::find_header(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::missing(ErrorCode::OrderNotFound, format!("Order {order_id}")))
    }

    /// GetAll
    pub async fn get_all(&self, client_id: i64) -> AppResult<Vec<Order>> {
        Ok(order::find_all(&self.pool, client_id).await?)
    }

    /// GetAllActive, grouped by table
    pub async fn get_all_active(&self, client_id: i64) -> AppResult<Vec<Vec<Order>>> {
        let orders = order::find_all_active(&self.pool, client_id).await?;
        Ok(group_by_table(orders))
    }

    /// GetTable
    pub async fn get_table(&self, table_id: i64) -> AppResult<DiningTable> {
        dining_table::get(&self.pool, table_id)
            .await
            .map_err(not_found_as(ErrorCode::TableNotFound))
    }

    /// Table lookup that tolerates a missing table
    pub async fn find_table(&self, table_id: i64) -> AppResult<Option<DiningTable>> {
        Ok(dining_table::find_by_id(&self.pool, table_id).await?)
    }

    /// GetDish, `None` when the dish does not exist
    pub async fn find_dish(&self, dish_id: i64) -> AppResult<Option<Dish>> {
        Ok(dish::find_by_id(&self.pool, dish_id).await?)
    }
}

fn not_found_as(code: ErrorCode) -> impl FnOnce(RepoError) -> AppError {
    move |err| match err {
        RepoError::NotFound(what) => AppError::missing(code, what),
        other => other.into(),
    }
}
