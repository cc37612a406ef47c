use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::{Config, ServerError};
use crate::db::DbService;
use crate::notify::{ConnectionRegistry, Dispatcher, EventBus};
use crate::orders::OrderStore;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 所有字段都可廉价克隆，处理器通过 `State<ServerState>` 获取。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | DbService | SQLite 连接池 |
/// | orders | OrderStore | 订单聚合存储 |
/// | events | EventBus | 通知队列 (生产端) |
/// | connections | ConnectionRegistry | 在线 WebSocket 连接 |
/// | shutdown_token | CancellationToken | 全局关闭信号 |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub orders: OrderStore,
    pub events: EventBus,
    pub connections: ConnectionRegistry,
    pub shutdown_token: CancellationToken,
    /// 尚未启动的分发器 (只能启动一次)
    dispatcher: Arc<Mutex<Option<Dispatcher>>>,
}

impl ServerState {
    /// 用已打开的数据库构造状态
    pub fn new(config: Config, db: DbService) -> Self {
        let (events, rx) = EventBus::new(config.event_queue_capacity, config.max_pending_publishes);
        let connections = ConnectionRegistry::new(config.connection_buffer);
        let shutdown_token = CancellationToken::new();
        let dispatcher = Dispatcher::new(rx, connections.clone(), shutdown_token.clone());

        Self {
            orders: OrderStore::new(db.pool.clone()),
            config,
            db,
            events,
            connections,
            shutdown_token,
            dispatcher: Arc::new(Mutex::new(Some(dispatcher))),
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 打开数据库 (文件库自动创建目录并执行迁移)
    /// 2. 创建通知总线、连接注册表和分发器
    pub async fn initialize(config: &Config) -> Result<Self, ServerError> {
        let db = if config.is_in_memory() {
            DbService::in_memory().await
        } else {
            DbService::new(&config.database_path).await
        }?;

        tracing::info!(
            database = %config.database_path,
            queue_capacity = config.event_queue_capacity,
            "Server state initialized"
        );
        Ok(Self::new(config.clone(), db))
    }

    /// 启动分发器，重复调用返回 `None`
    pub async fn start_background_tasks(&self) -> Option<JoinHandle<()>> {
        let dispatcher = self.dispatcher.lock().await.take()?;
        Some(dispatcher.spawn())
    }

    /// 发出关闭信号 (分发器和所有 WebSocket 会话退出)
    pub fn shutdown(&self) {
        self.shutdown_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dispatcher_starts_once() {
        let state = ServerState::initialize(&Config::for_tests()).await.unwrap();
        let handle = state.start_background_tasks().await.unwrap();
        assert!(state.start_background_tasks().await.is_none());

        state.shutdown();
        handle.await.unwrap();
    }
}
