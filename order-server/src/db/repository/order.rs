//! Order Repository
//!
//! Orders, their items and the ingredient selections of each item.
//! Read paths assemble the full aggregate (order → table, order → items →
//! dish + selections → ingredient).

use super::{RepoError, RepoResult, dining_table, dish};
use serde_json::{Map, Value};
use shared::models::{DiningTable, IngredientSelection, ItemCreate, Order, OrderCreate, OrderItem, OrderUpdate};
use sqlx::SqlitePool;

const ORDER_COLUMNS: &str = "id, client_id, table_id, canceled, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, order_id, mount, active, ready, dish_id, takeaway, created_at";

/// Item keys silently dropped from a patch
pub const PROTECTED_ITEM_FIELDS: [&str; 4] = ["order_id", "dish_id", "takeaway", "mount"];

/// Persist a new order with no items
pub async fn create(pool: &SqlitePool, data: &OrderCreate) -> RepoResult<Order> {
    let client_id = data
        .client_id
        .ok_or_else(|| RepoError::RequiredField("client_id".into()))?;
    let table_id = data
        .resolved_table_id()
        .ok_or_else(|| RepoError::RequiredField("table_id".into()))?;

    let now = shared::util::now_millis();
    let id = sqlx::query(
        "INSERT INTO orders (client_id, table_id, canceled, created_at, updated_at) VALUES (?1, ?2, 0, ?3, ?3)",
    )
    .bind(client_id)
    .bind(table_id)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| insert_failed(e, "Order could not be created".into()))?
    .last_insert_rowid();

    Ok(Order {
        id,
        client_id,
        table_id,
        canceled: false,
        created_at: now,
        updated_at: now,
        table: None,
        items: Vec::new(),
    })
}

/// Append items (and their ingredient selections) to an order
///
/// Runs in one transaction: either every item and selection is written or
/// nothing is. Returns the ids of the new items in payload order.
pub async fn add_items(pool: &SqlitePool, order_id: i64, items: &[ItemCreate]) -> RepoResult<Vec<i64>> {
    if let Some(bad) = items.iter().find(|item| item.mount < 1) {
        return Err(RepoError::Validation(format!(
            "mount must be at least 1, got {}",
            bad.mount
        )));
    }

    let mut tx = pool.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM orders WHERE id = ?")
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(RepoError::NotFound(format!("Order {order_id}")));
    }

    let now = shared::util::now_millis();
    let mut item_ids = Vec::with_capacity(items.len());

    for item in items {
        let dish_id = item
            .resolved_dish_id()
            .ok_or_else(|| RepoError::RequiredField("dish_id".into()))?;

        let item_id = sqlx::query(
            "INSERT INTO order_item (order_id, mount, active, ready, dish_id, takeaway, created_at) VALUES (?, ?, 1, ?, ?, ?, ?)",
        )
        .bind(order_id)
        .bind(item.mount)
        .bind(item.ready)
        .bind(dish_id)
        .bind(item.takeaway)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| insert_failed(e, format!("Item could not be added to order {order_id}")))?
        .last_insert_rowid();

        for choice in &item.ingredients {
            sqlx::query(
                "INSERT INTO ingredient_selection (item_id, ingredient_id, active) VALUES (?, ?, ?)",
            )
            .bind(item_id)
            .bind(choice.id)
            .bind(choice.active)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                insert_failed(e, format!("Ingredient {} could not be selected", choice.id))
            })?;
        }

        item_ids.push(item_id);
    }

    sqlx::query("UPDATE orders SET updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

    tx.commit()
        .await
        .map_err(|e| insert_failed(e, format!("Items of order {order_id} could not be saved")))?;
    Ok(item_ids)
}

/// Sparse status update of one item
///
/// Protected keys are dropped first. What remains may only contain boolean
/// `ready` / `active` entries; an empty patch is a no-op.
pub async fn patch_item(pool: &SqlitePool, item_id: i64, mut updates: Map<String, Value>) -> RepoResult<()> {
    for key in PROTECTED_ITEM_FIELDS {
        updates.remove(key);
    }

    let mut ready = None;
    let mut active = None;
    for (key, value) in &updates {
        let slot = match key.as_str() {
            "ready" => &mut ready,
            "active" => &mut active,
            other => {
                return Err(RepoError::Validation(format!("Field '{other}' cannot be patched")));
            }
        };
        let flag = value
            .as_bool()
            .ok_or_else(|| RepoError::Validation(format!("Field '{key}' must be a boolean")))?;
        *slot = Some(flag);
    }

    if ready.is_none() && active.is_none() {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM order_item WHERE id = ?")
            .bind(item_id)
            .fetch_optional(pool)
            .await?;
        return match exists {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound(format!("Item {item_id}"))),
        };
    }

    let result = sqlx::query(
        "UPDATE order_item SET ready = COALESCE(?, ready), active = COALESCE(?, active) WHERE id = ?",
    )
    .bind(ready)
    .bind(active)
    .bind(item_id)
    .execute(pool)
    .await
    .map_err(|e| update_failed(e, format!("Item {item_id} could not be updated")))?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Item {item_id}")));
    }
    Ok(())
}

/// Update an order; `canceled` is the only writable field
pub async fn update(pool: &SqlitePool, order_id: i64, data: &OrderUpdate) -> RepoResult<()> {
    let result = sqlx::query(
        "UPDATE orders SET canceled = COALESCE(?, canceled), updated_at = ? WHERE id = ?",
    )
    .bind(data.canceled)
    .bind(shared::util::now_millis())
    .bind(order_id)
    .execute(pool)
    .await
    .map_err(|e| update_failed(e, format!("Order {order_id} could not be updated")))?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Order {order_id}")));
    }
    Ok(())
}

/// Database text stays in the log; callers only see `message`
fn insert_failed(err: sqlx::Error, message: String) -> RepoError {
    tracing::error!(error = %err, "{message}");
    RepoError::InsertFailed(message)
}

fn update_failed(err: sqlx::Error, message: String) -> RepoError {
    tracing::error!(error = %err, "{message}");
    RepoError::UpdateFailed(message)
}

/// Full aggregate of one order
///
/// Fails with `NotFound` when the order or its table is missing.
pub async fn find_by_id(pool: &SqlitePool, order_id: i64) -> RepoResult<Order> {
    let mut order = find_header(pool, order_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {order_id}")))?;

    order.items = find_items(pool, order.id).await?;
    order.table = Some(dining_table::get(pool, order.table_id).await?);
    Ok(order)
}

/// Order row only, without items or table
pub async fn find_header(pool: &SqlitePool, order_id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(order_id)
        .fetch_optional(pool)
        .await?;
    Ok(order)
}

/// Every order of a client, oldest first
pub async fn find_all(pool: &SqlitePool, client_id: i64) -> RepoResult<Vec<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE client_id = ? ORDER BY created_at, id");
    let orders = sqlx::query_as::<_, Order>(&sql)
        .bind(client_id)
        .fetch_all(pool)
        .await?;
    assemble_all(pool, orders).await
}

/// Non-canceled orders of a client, by id ascending
pub async fn find_all_active(pool: &SqlitePool, client_id: i64) -> RepoResult<Vec<Order>> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE client_id = ? AND canceled = 0 ORDER BY id"
    );
    let orders = sqlx::query_as::<_, Order>(&sql)
        .bind(client_id)
        .fetch_all(pool)
        .await?;
    assemble_all(pool, orders).await
}

/// List views degrade a missing table to a placeholder carrying only its id
async fn assemble_all(pool: &SqlitePool, mut orders: Vec<Order>) -> RepoResult<Vec<Order>> {
    for order in &mut orders {
        order.items = find_items(pool, order.id).await?;
        let table = dining_table::find_by_id(pool, order.table_id)
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| DiningTable::placeholder(order.table_id));
        order.table = Some(table);
    }
    Ok(orders)
}

/// Items of an order with dish snapshots and resolved selections
///
/// A missing dish becomes an empty dish and a missing ingredient leaves the
/// selection without snapshot; neither fails the read.
async fn find_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM order_item WHERE order_id = ? ORDER BY id");
    let mut items = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;

    for item in &mut items {
        let mut selections = sqlx::query_as::<_, IngredientSelection>(
            "SELECT id, item_id, ingredient_id, active FROM ingredient_selection WHERE item_id = ? ORDER BY id",
        )
        .bind(item.id)
        .fetch_all(pool)
        .await?;

        for selection in &mut selections {
            selection.ingredient = dish::find_ingredient(pool, selection.ingredient_id)
                .await
                .ok()
                .flatten();
        }
        item.selected_ingredients = selections;

        let snapshot = match dish::find_by_id(pool, item.dish_id).await {
            Ok(Some(d)) => d,
            Ok(None) => {
                tracing::debug!(item_id = item.id, dish_id = item.dish_id, "Dish missing, using empty snapshot");
                Default::default()
            }
            Err(e) => {
                tracing::warn!(item_id = item.id, dish_id = item.dish_id, error = %e, "Dish lookup failed, using empty snapshot");
                Default::default()
            }
        };
        item.dish = Some(snapshot);
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::{self, insert_dish, insert_ingredient, insert_table};
    use serde_json::json;
    use shared::models::{DishRef, IngredientChoice, TableKind};

    fn item(dish_id: i64, ingredients: &[(i64, bool)]) -> ItemCreate {
        ItemCreate {
            dish_id: None,
            dish: Some(DishRef { id: dish_id }),
            mount: 1,
            takeaway: false,
            ready: false,
            ingredients: ingredients
                .iter()
                .map(|&(id, active)| IngredientChoice { id, active })
                .collect(),
        }
    }

    fn new_order(client_id: i64, table_id: i64) -> OrderCreate {
        OrderCreate {
            client_id: Some(client_id),
            table_id: Some(table_id),
            table: None,
        }
    }

    async fn seeded_pool() -> SqlitePool {
        let pool = test_support::pool().await;
        insert_table(&pool, 3, 7, 3, TableKind::Table).await;
        insert_dish(&pool, 1, 7, "Soup", "soup.png").await;
        insert_ingredient(&pool, 10, 1, "Onion").await;
        insert_ingredient(&pool, 11, 1, "Garlic").await;
        insert_ingredient(&pool, 12, 1, "Pepper").await;
        pool
    }

    #[tokio::test]
    async fn test_create_requires_client_and_table() {
        let pool = seeded_pool().await;

        let err = create(&pool, &OrderCreate { client_id: None, ..new_order(7, 3) }).await;
        assert!(matches!(err, Err(RepoError::RequiredField(f)) if f == "client_id"));

        let err = create(&pool, &OrderCreate { table_id: None, ..new_order(7, 3) }).await;
        assert!(matches!(err, Err(RepoError::RequiredField(f)) if f == "table_id"));
    }

    #[tokio::test]
    async fn test_create_resolves_inlined_table() {
        let pool = seeded_pool().await;
        let payload = OrderCreate {
            client_id: Some(7),
            table_id: None,
            table: Some(shared::models::TableRef { id: 3 }),
        };
        let order = create(&pool, &payload).await.unwrap();
        assert_eq!(order.table_id, 3);
        assert!(order.table.is_none());
        assert!(order.items.is_empty());
        assert!(!order.canceled);
    }

    #[tokio::test]
    async fn test_ingredient_selections_round_trip() {
        let pool = seeded_pool().await;
        let order = create(&pool, &new_order(7, 3)).await.unwrap();

        let ids = add_items(&pool, order.id, &[item(1, &[(10, true), (11, false), (12, true)])])
            .await
            .unwrap();
        assert_eq!(ids.len(), 1);

        let stored = find_by_id(&pool, order.id).await.unwrap();
        assert_eq!(stored.table.as_ref().map(|t| t.number), Some(3));
        assert_eq!(stored.items.len(), 1);

        let item = &stored.items[0];
        assert!(item.active);
        assert_eq!(item.dish.as_ref().map(|d| d.name.as_str()), Some("Soup"));
        assert_eq!(item.selected_ingredients.len(), 3);
        let resolved: Vec<_> = item
            .selected_ingredients
            .iter()
            .map(|s| (s.ingredient_id, s.active, s.ingredient.as_ref().map(|i| i.name.clone())))
            .collect();
        assert_eq!(
            resolved,
            vec![
                (10, true, Some("Onion".to_string())),
                (11, false, Some("Garlic".to_string())),
                (12, true, Some("Pepper".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_ingredient_and_dish_degrade() {
        let pool = seeded_pool().await;
        let order = create(&pool, &new_order(7, 3)).await.unwrap();
        add_items(&pool, order.id, &[item(1, &[(10, true), (99, true)]), item(404, &[])])
            .await
            .unwrap();

        let stored = find_by_id(&pool, order.id).await.unwrap();
        let selections = &stored.items[0].selected_ingredients;
        assert_eq!(selections.len(), 2);
        assert!(selections[0].ingredient.is_some());
        assert!(selections[1].ingredient.is_none());

        let placeholder = stored.items[1].dish.as_ref().unwrap();
        assert_eq!(placeholder.id, 0);
        assert!(placeholder.name.is_empty());
    }

    #[tokio::test]
    async fn test_add_items_is_all_or_nothing() {
        let pool = seeded_pool().await;
        let order = create(&pool, &new_order(7, 3)).await.unwrap();

        sqlx::query(
            "CREATE TRIGGER reject_pepper BEFORE INSERT ON ingredient_selection \
             WHEN NEW.ingredient_id = 12 BEGIN SELECT RAISE(ABORT, 'pepper rejected'); END",
        )
        .execute(&pool)
        .await
        .unwrap();
        let err = add_items(&pool, order.id, &[item(1, &[(11, true)]), item(1, &[(12, true)])]).await;
        match err {
            Err(RepoError::InsertFailed(message)) => {
                assert_eq!(message, "Ingredient 12 could not be selected");
            }
            other => panic!("expected insert failure, got {other:?}"),
        }

        let mut no_dish = item(1, &[]);
        no_dish.dish = None;
        let err = add_items(&pool, order.id, &[item(1, &[]), no_dish]).await;
        assert!(matches!(err, Err(RepoError::RequiredField(_))));

        let stored = find_by_id(&pool, order.id).await.unwrap();
        assert!(stored.items.is_empty());
        let selections: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ingredient_selection")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(selections, 0);
    }

    #[tokio::test]
    async fn test_add_items_rejects_non_positive_mount() {
        let pool = seeded_pool().await;
        let order = create(&pool, &new_order(7, 3)).await.unwrap();

        for mount in [0, -3] {
            let mut bad = item(1, &[]);
            bad.mount = mount;
            let err = add_items(&pool, order.id, &[item(1, &[]), bad]).await;
            assert!(matches!(err, Err(RepoError::Validation(ref m)) if m.contains("mount")));
        }
        assert!(find_by_id(&pool, order.id).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_add_items_to_missing_order() {
        let pool = seeded_pool().await;
        let err = add_items(&pool, 999, &[item(1, &[])]).await;
        assert!(matches!(err, Err(RepoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_patch_item_ignores_protected_fields() {
        let pool = seeded_pool().await;
        let order = create(&pool, &new_order(7, 3)).await.unwrap();
        let mut payload = item(1, &[]);
        payload.mount = 2;
        let ids = add_items(&pool, order.id, &[payload]).await.unwrap();

        let patch = json!({
            "order_id": 500,
            "dish_id": 404,
            "takeaway": true,
            "mount": 9,
            "ready": true
        });
        let Value::Object(map) = patch else { unreachable!() };
        patch_item(&pool, ids[0], map).await.unwrap();

        let stored = &find_by_id(&pool, order.id).await.unwrap().items[0];
        assert!(stored.ready);
        assert!(stored.active);
        assert_eq!(stored.order_id, order.id);
        assert_eq!(stored.dish_id, 1);
        assert!(!stored.takeaway);
        assert_eq!(stored.mount, 2);
    }

    #[tokio::test]
    async fn test_patch_item_rejects_and_no_ops() {
        let pool = seeded_pool().await;
        let order = create(&pool, &new_order(7, 3)).await.unwrap();
        let ids = add_items(&pool, order.id, &[item(1, &[])]).await.unwrap();

        let Value::Object(unknown) = json!({"price": 1}) else { unreachable!() };
        assert!(matches!(patch_item(&pool, ids[0], unknown).await, Err(RepoError::Validation(_))));

        let Value::Object(not_bool) = json!({"ready": "yes"}) else { unreachable!() };
        assert!(matches!(patch_item(&pool, ids[0], not_bool).await, Err(RepoError::Validation(_))));

        let Value::Object(only_protected) = json!({"mount": 3}) else { unreachable!() };
        patch_item(&pool, ids[0], only_protected.clone()).await.unwrap();
        assert!(matches!(patch_item(&pool, 999, only_protected).await, Err(RepoError::NotFound(_))));
        assert!(matches!(patch_item(&pool, 999, Map::new()).await, Err(RepoError::NotFound(_))));

        let Value::Object(missing) = json!({"active": false}) else { unreachable!() };
        assert!(matches!(patch_item(&pool, 999, missing).await, Err(RepoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_only_toggles_canceled() {
        let pool = seeded_pool().await;
        let order = create(&pool, &new_order(7, 3)).await.unwrap();

        update(&pool, order.id, &OrderUpdate { canceled: Some(true) }).await.unwrap();
        let stored = find_by_id(&pool, order.id).await.unwrap();
        assert!(stored.canceled);
        assert_eq!(stored.client_id, 7);
        assert_eq!(stored.table_id, 3);

        update(&pool, order.id, &OrderUpdate { canceled: None }).await.unwrap();
        assert!(find_by_id(&pool, order.id).await.unwrap().canceled);

        let err = update(&pool, 999, &OrderUpdate { canceled: Some(true) }).await;
        assert!(matches!(err, Err(RepoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_table_fails_by_id_but_degrades_in_lists() {
        let pool = seeded_pool().await;
        let order = create(&pool, &new_order(7, 55)).await.unwrap();

        assert!(matches!(find_by_id(&pool, order.id).await, Err(RepoError::NotFound(_))));

        let all = find_all(&pool, 7).await.unwrap();
        assert_eq!(all.len(), 1);
        let table = all[0].table.as_ref().unwrap();
        assert_eq!(table.id, 55);
        assert_eq!(table.number, 0);
    }

    #[tokio::test]
    async fn test_find_all_active_filters_client_and_canceled() {
        let pool = seeded_pool().await;
        insert_table(&pool, 4, 8, 1, TableKind::Bar).await;
        let a = create(&pool, &new_order(7, 3)).await.unwrap();
        let b = create(&pool, &new_order(7, 3)).await.unwrap();
        let _other_client = create(&pool, &new_order(8, 4)).await.unwrap();
        update(&pool, a.id, &OrderUpdate { canceled: Some(true) }).await.unwrap();

        let active = find_all_active(&pool, 7).await.unwrap();
        let ids: Vec<_> = active.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![b.id]);

        let all = find_all(&pool, 7).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|o| o.client_id == 7));
    }
}
