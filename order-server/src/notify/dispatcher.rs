//! 通知分发器
//!
//! 进程生命周期内只有一个分发任务: 从总线取出通知、序列化，
//! 然后投递给目标客户端的所有连接。没有匹配连接时静默丢弃，不重试。
//! 序列化失败时，目标客户端的连接收到错误负载后被关闭，分发继续。

use shared::{ApiResponse, AppError, Notification};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::registry::ConnectionRegistry;

pub struct Dispatcher {
    rx: mpsc::Receiver<Notification>,
    registry: ConnectionRegistry,
    shutdown: CancellationToken,
}

impl Dispatcher {
    pub fn new(
        rx: mpsc::Receiver<Notification>,
        registry: ConnectionRegistry,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            rx,
            registry,
            shutdown,
        }
    }

    /// 在独立任务中运行
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// 分发循环，直到取消或所有发送端关闭
    pub async fn run(mut self) {
        tracing::info!("Notification dispatcher started");
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Notification dispatcher received shutdown signal");
                    break;
                }
                next = self.rx.recv() => {
                    match next {
                        Some(notification) => self.dispatch(&notification),
                        None => {
                            tracing::info!("Event bus closed, dispatcher stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    fn dispatch(&self, notification: &Notification) {
        self.deliver(notification.client_id, serde_json::to_string(notification));
    }

    /// 返回写入缓冲的连接数 (序列化失败时为关闭的连接数)
    fn deliver(&self, client_id: i64, payload: serde_json::Result<String>) -> usize {
        match payload {
            Ok(text) => {
                let delivered = self.registry.broadcast_to_client(client_id, &text);
                tracing::debug!(client_id, delivered, "Notification dispatched");
                delivered
            }
            Err(e) => {
                tracing::error!(client_id, error = %e, "Failed to serialize notification");
                let err = AppError::serialization(&e);
                let reason = serde_json::to_string(&ApiResponse::<()>::from(err.clone()))
                    .unwrap_or(err.message);
                self.registry
                    .close_matching(|info| info.client_id == client_id, &reason)
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
