//! 实时通知
//!
//! ```text
//! HTTP handler ──publish──▶ EventBus (有界队列) ──▶ Dispatcher ──▶ ConnectionRegistry ──▶ WebSocket
//! ```
//!
//! - [`EventBus`] - 有界队列 + 后台发布
//! - [`Dispatcher`] - 唯一消费者，按客户端投递
//! - [`ConnectionRegistry`] - 在线连接

pub mod bus;
pub mod dispatcher;
pub mod registry;

pub use bus::EventBus;
pub use dispatcher::Dispatcher;
pub use registry::{ConnectionInfo, ConnectionRegistry, Outbound};
