//! HTTP API
//!
//! # 路由
//!
//! | 前缀 | 模块 | 说明 |
//! |------|------|------|
//! | /health | [`health`] | 存活检查 |
//! | /api/v1/orders | [`orders`] | 订单、呼叫和 WebSocket 通知 |

use std::any::Any;
use std::time::Duration;

use axum::Router;
use axum::response::{IntoResponse, Response};
use shared::{AppError, ErrorCode};
use http::{HeaderName, HeaderValue, Method, header};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

pub mod health;
pub mod orders;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// UUID v4 per request, echoed back in `x-request-id`
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// 处理器 panic 时返回统一错误体 (9001)
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Handler panicked");
    AppError::new(ErrorCode::InternalError).into_response()
}

/// Routes only, without middleware
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
}

/// CORS: any origin (mirrored so credentials stay allowed), 5 minute preflight cache
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(300))
}

/// Build a fully configured application with all middleware
///
/// Used by the HTTP server and by oneshot tests
pub fn build_app() -> Router<ServerState> {
    build_router()
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        // Propagate copies the header the outer Set layer already put on the request
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
}
