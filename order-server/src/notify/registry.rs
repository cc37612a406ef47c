//! 连接注册表
//!
//! 保存所有在线 WebSocket 连接 (连接 ID → 客户端 ID + 发送通道)。
//! 注册、注销和遍历可以并发进行，底层为分片并发 Map。
//!
//! 投递是尽力而为的: 发送缓冲已满时丢弃该连接的这条消息，
//! 通道已关闭的连接在遍历结束后被清理。失败不会返回给调用方。

use dashmap::DashMap;
use shared::Notification;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

/// 发往单个连接的出站消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// 文本帧 (序列化后的通知)
    Text(String),
    /// 发送错误负载后关闭连接
    Close(String),
}

/// 连接的不可变信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub id: Uuid,
    pub client_id: i64,
}

struct Connection {
    info: ConnectionInfo,
    tx: mpsc::Sender<Outbound>,
}

/// 在线连接注册表 (可廉价克隆，内部共享)
#[derive(Clone)]
pub struct ConnectionRegistry {
    connections: Arc<DashMap<Uuid, Connection>>,
    buffer: usize,
}

impl ConnectionRegistry {
    /// `buffer`: 每个连接的出站缓冲大小
    pub fn new(buffer: usize) -> Self {
        Self {
            connections: Arc::new(DashMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// 注册新连接
    ///
    /// 返回连接 ID 和出站接收端。`Connected` 确认在注册前写入该连接自己的
    /// 缓冲，因此它总是该连接收到的第一条消息，且不会发给其他连接。
    pub fn on_connect(&self, client_id: i64) -> (Uuid, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(self.buffer);
        let info = ConnectionInfo {
            id: Uuid::new_v4(),
            client_id,
        };

        match serde_json::to_string(&Notification::connected(client_id)) {
            Ok(payload) => {
                // 新建通道至少有一个空位
                let _ = tx.try_send(Outbound::Text(payload));
            }
            Err(e) => {
                tracing::warn!(client_id, error = %e, "Failed to serialize connected notification");
            }
        }

        self.connections.insert(info.id, Connection { info, tx });
        tracing::info!(
            connection_id = %info.id,
            client_id,
            total = self.connections.len(),
            "Connection registered"
        );
        (info.id, rx)
    }

    /// 注销连接 (不发送任何通知)
    pub fn on_disconnect(&self, id: Uuid) {
        if let Some((_, conn)) = self.connections.remove(&id) {
            tracing::info!(
                connection_id = %id,
                client_id = conn.info.client_id,
                total = self.connections.len(),
                "Connection unregistered"
            );
        }
    }

    /// 向所有满足条件的连接投递负载，返回成功写入缓冲的连接数
    pub fn broadcast<F>(&self, payload: &str, matches: F) -> usize
    where
        F: Fn(&ConnectionInfo) -> bool,
    {
        let mut delivered = 0;
        let mut closed = Vec::new();

        for entry in self.connections.iter() {
            let conn = entry.value();
            if !matches(&conn.info) {
                continue;
            }
            match conn.tx.try_send(Outbound::Text(payload.to_owned())) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        connection_id = %conn.info.id,
                        client_id = conn.info.client_id,
                        "Outbound buffer full, message dropped"
                    );
                }
                Err(TrySendError::Closed(_)) => closed.push(conn.info.id),
            }
        }

        // 遍历结束后再删除，避免持有分片锁时修改
        for id in closed {
            self.on_disconnect(id);
        }
        delivered
    }

    /// 投递给某个客户端的全部连接
    pub fn broadcast_to_client(&self, client_id: i64, payload: &str) -> usize {
        self.broadcast(payload, |info| info.client_id == client_id)
    }

    /// 向满足条件的连接发送错误负载并关闭，返回关闭的连接数
    pub fn close_matching<F>(&self, matches: F, reason: &str) -> usize
    where
        F: Fn(&ConnectionInfo) -> bool,
    {
        let targets: Vec<Uuid> = self
            .connections
            .iter()
            .filter(|entry| matches(&entry.value().info))
            .map(|entry| *entry.key())
            .collect();

        let mut closed = 0;
        for id in targets {
            if let Some((_, conn)) = self.connections.remove(&id) {
                let _ = conn.tx.try_send(Outbound::Close(reason.to_owned()));
                tracing::warn!(
                    connection_id = %id,
                    client_id = conn.info.client_id,
                    "Connection closed by server"
                );
                closed += 1;
            }
        }
        closed
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn client_connection_count(&self, client_id: i64) -> usize {
        self.connections
            .iter()
            .filter(|entry| entry.value().info.client_id == client_id)
            .count()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.connections.len())
            .field("buffer", &self.buffer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::NotificationType;

    fn text(msg: Option<Outbound>) -> String {
        match msg {
            Some(Outbound::Text(s)) => s,
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connected_goes_only_to_new_connection() {
        let registry = ConnectionRegistry::new(8);
        let (_, mut first) = registry.on_connect(7);
        let ack = text(first.recv().await);
        let n: Notification = serde_json::from_str(&ack).unwrap();
        assert_eq!(n.kind, NotificationType::Connected);
        assert_eq!(n.client_id, 7);
        assert_eq!(n.message, "Connected");

        let (_, mut second) = registry.on_connect(7);
        let ack = text(second.recv().await);
        assert!(ack.contains("Connected"));

        // 第一个连接没有收到第二个连接的确认
        assert!(first.try_recv().is_err());
        assert_eq!(registry.connection_count(), 2);
        assert_eq!(registry.client_connection_count(7), 2);
    }

    #[tokio::test]
    async fn test_broadcast_filters_by_client() {
        let registry = ConnectionRegistry::new(8);
        let (_, mut a) = registry.on_connect(7);
        let (_, mut b) = registry.on_connect(8);
        a.recv().await;
        b.recv().await;

        assert_eq!(registry.broadcast_to_client(7, "hello"), 1);
        assert_eq!(text(a.recv().await), "hello");
        assert!(b.try_recv().is_err());

        assert_eq!(registry.broadcast_to_client(99, "nobody"), 0);
    }

    #[tokio::test]
    async fn test_disconnect_and_closed_receivers_are_pruned() {
        let registry = ConnectionRegistry::new(8);
        let (id, _rx) = registry.on_connect(7);
        let (_, dropped) = registry.on_connect(7);
        drop(dropped);

        assert_eq!(registry.broadcast_to_client(7, "x"), 1);
        assert_eq!(registry.connection_count(), 1);

        registry.on_disconnect(id);
        assert_eq!(registry.connection_count(), 0);
        // 重复注销无副作用
        registry.on_disconnect(id);
    }

    #[tokio::test]
    async fn test_full_buffer_drops_message() {
        let registry = ConnectionRegistry::new(1);
        let (_, mut rx) = registry.on_connect(7);
        // 缓冲仍被 Connected 占用
        assert_eq!(registry.broadcast_to_client(7, "lost"), 0);
        assert_eq!(registry.connection_count(), 1);

        rx.recv().await;
        assert_eq!(registry.broadcast_to_client(7, "kept"), 1);
        assert_eq!(text(rx.recv().await), "kept");
    }

    #[tokio::test]
    async fn test_close_matching() {
        let registry = ConnectionRegistry::new(8);
        let (_, mut a) = registry.on_connect(7);
        let (_, mut b) = registry.on_connect(8);
        a.recv().await;
        b.recv().await;

        assert_eq!(registry.close_matching(|info| info.client_id == 7, "bad payload"), 1);
        assert_eq!(a.recv().await, Some(Outbound::Close("bad payload".into())));
        assert_eq!(registry.connection_count(), 1);
        assert_eq!(registry.client_connection_count(7), 0);
        assert!(b.try_recv().is_err());
    }
}
