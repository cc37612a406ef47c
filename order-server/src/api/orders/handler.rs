//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use http::StatusCode;
use serde_json::{Map, Value};
use shared::models::{ItemCreate, Order, OrderCreate, OrderUpdate};
use shared::{ApiResponse, AppError, AppResult, Notification};

use crate::core::ServerState;
use crate::orders::OrderStore;

/// 通知发布失败只记录日志: 状态变更已经完成，HTTP 请求仍然成功
fn log_publish_failure(result: AppResult<()>, action: &'static str) {
    if let Err(e) = result {
        tracing::warn!(action, code = %e.code, error = %e, "Notification not published");
    }
}

/// GET /api/v1/orders/call/{table_id}/waiter - 呼叫服务员
pub async fn call_waiter(
    State(state): State<ServerState>,
    Path(table_id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    let table = state.orders.get_table(table_id).await?;
    tracing::info!(table_id, client_id = table.client_id, "Waiter called");
    log_publish_failure(state.events.publish(Notification::call_waiter(table)), "call_waiter");
    Ok(Json(ApiResponse::ok()))
}

/// GET /api/v1/orders/call/{table_id}/bill - 请求结账
pub async fn call_bill(
    State(state): State<ServerState>,
    Path(table_id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    let table = state.orders.get_table(table_id).await?;
    tracing::info!(table_id, client_id = table.client_id, "Bill requested");
    log_publish_failure(state.events.publish(Notification::get_check(table)), "get_check");
    Ok(Json(ApiResponse::ok()))
}

/// POST /api/v1/orders - 创建订单
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<OrderCreate>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let order = state.orders.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// PUT /api/v1/orders/{id} - 更新订单 (仅取消状态)
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderUpdate>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.orders.update(id, &payload).await?;
    Ok(Json(ApiResponse::ok()))
}

/// PUT /api/v1/orders/add/{id}/client/{client_id} - 追加菜品
///
/// 菜品全部写入后，为每个菜品发布一条 `MakeOrder` 通知 (按请求顺序)。
pub async fn add_items(
    State(state): State<ServerState>,
    Path((id, client_id)): Path<(i64, i64)>,
    Json(items): Json<Vec<ItemCreate>>,
) -> AppResult<Json<ApiResponse<Vec<i64>>>> {
    let order = state.orders.get_header(id).await?;
    if order.client_id != client_id {
        return Err(AppError::client_mismatch(id, client_id));
    }

    let item_ids = state.orders.add_items(id, &items).await?;

    let store = state.orders.clone();
    log_publish_failure(
        state.events.publish_with(build_order_notifications(store, order, items)),
        "make_order",
    );
    Ok(Json(ApiResponse::success(item_ids)))
}

/// 为每个新菜品构建通知; 菜品或桌台查不到时降级 (空菜名 / 无桌台后缀)
///
/// 属于其他客户端的桌台同样不附带，通知只携带订单所属客户端的数据。
async fn build_order_notifications(
    store: OrderStore,
    order: Order,
    items: Vec<ItemCreate>,
) -> Vec<Notification> {
    let table = match store.find_table(order.table_id).await {
        Ok(Some(table)) if table.client_id != order.client_id => {
            tracing::warn!(
                order_id = order.id,
                table_id = table.id,
                table_client_id = table.client_id,
                "Table of another client left out of notification"
            );
            None
        }
        Ok(table) => table,
        Err(e) => {
            tracing::warn!(order_id = order.id, error = %e, "Table lookup failed for notification");
            None
        }
    };

    let mut notifications = Vec::with_capacity(items.len());
    for item in &items {
        let dish = match item.resolved_dish_id() {
            Some(dish_id) => store.find_dish(dish_id).await.ok().flatten(),
            None => None,
        }
        .unwrap_or_default();
        notifications.push(Notification::make_order(order.client_id, &dish, table.clone()));
    }
    notifications
}

/// PATCH /api/v1/orders/item/{id} - 更新菜品状态
pub async fn patch_item(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(updates): Json<Map<String, Value>>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.orders.patch_item(id, updates).await?;
    Ok(Json(ApiResponse::ok()))
}

/// GET /api/v1/orders/{id} - 获取订单详情
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let order = state.orders.get_by_id(id).await?;
    Ok(Json(order))
}

/// GET /api/v1/orders/client/{client_id} - 客户端全部订单
pub async fn list_by_client(
    State(state): State<ServerState>,
    Path(client_id): Path<i64>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state.orders.get_all(client_id).await?;
    Ok(Json(orders))
}

/// GET /api/v1/orders/active/{client_id} - 未取消订单，按桌台分组
pub async fn list_active(
    State(state): State<ServerState>,
    Path(client_id): Path<i64>,
) -> AppResult<Json<Vec<Vec<Order>>>> {
    let groups = state.orders.get_all_active(client_id).await?;
    Ok(Json(groups))
}
