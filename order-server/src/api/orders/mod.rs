//! Order API Module
//!
//! 订单、桌台呼叫和实时通知。认证由上游网关完成。

mod handler;
mod ws;

use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/v1/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        // Realtime notifications (path segment is the client id)
        .route("/{id}/ws", get(ws::handle_ws))
        // Table calls
        .route("/call/{table_id}/waiter", get(handler::call_waiter))
        .route("/call/{table_id}/bill", get(handler::call_bill))
        // Orders
        .route("/", post(handler::create))
        .route("/{id}", get(handler::get_by_id).put(handler::update))
        .route("/add/{id}/client/{client_id}", put(handler::add_items))
        .route("/item/{id}", patch(handler::patch_item))
        // Client views
        .route("/client/{client_id}", get(handler::list_by_client))
        .route("/active/{client_id}", get(handler::list_active))
}
