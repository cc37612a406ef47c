//! 通知事件总线
//!
//! 进程内唯一的有界队列。生产者 (HTTP 处理器) 通过 [`EventBus::publish`]
//! 在后台任务中入队，不阻塞 HTTP 响应；分发器是唯一的消费者。
//!
//! # 背压
//!
//! - [`EventBus::enqueue`]: 队列满时等待空位，不丢弃
//! - [`EventBus::try_enqueue`]: 队列满时立即返回 `EventQueueFull`
//! - [`EventBus::publish`]: 后台任务数受信号量限制，
//!   达到上限时立即返回 `EventQueueOverloaded`

use shared::{AppError, AppResult, ErrorCode, Notification};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::sync::mpsc::error::TrySendError;

#[derive(Clone, Debug)]
pub struct EventBus {
    tx: mpsc::Sender<Notification>,
    pending: Arc<Semaphore>,
    max_pending: usize,
}

impl EventBus {
    /// 创建总线，返回分发器使用的接收端
    pub fn new(capacity: usize, max_pending: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let max_pending = max_pending.max(1);
        let bus = Self {
            tx,
            pending: Arc::new(Semaphore::new(max_pending)),
            max_pending,
        };
        (bus, rx)
    }

    /// 入队，队列满时等待
    pub async fn enqueue(&self, notification: Notification) -> AppResult<()> {
        self.tx
            .send(notification)
            .await
            .map_err(|_| AppError::new(ErrorCode::EventBusClosed))
    }

    /// 非阻塞入队
    pub fn try_enqueue(&self, notification: Notification) -> AppResult<()> {
        self.tx.try_send(notification).map_err(|e| match e {
            TrySendError::Full(_) => AppError::new(ErrorCode::EventQueueFull),
            TrySendError::Closed(_) => AppError::new(ErrorCode::EventBusClosed),
        })
    }

    /// 后台发布单条通知
    pub fn publish(&self, notification: Notification) -> AppResult<()> {
        self.publish_with(async move { vec![notification] })
    }

    /// 后台构建并发布一组通知
    ///
    /// `build` 在后台任务中执行 (可以做数据库查询)，
    /// 结果由同一个任务按顺序入队。
    pub fn publish_with<F>(&self, build: F) -> AppResult<()>
    where
        F: Future<Output = Vec<Notification>> + Send + 'static,
    {
        let permit = self
            .pending
            .clone()
            .try_acquire_owned()
            .map_err(|_| AppError::overloaded(self.max_pending))?;

        let bus = self.clone();
        tokio::spawn(async move {
            let _permit = permit;
            for notification in build.await {
                if let Err(e) = bus.enqueue(notification).await {
                    tracing::warn!(error = %e, "Notification dropped");
                    break;
                }
            }
        });
        Ok(())
    }

    /// 正在等待入队的后台发布任务数
    pub fn pending_publishes(&self) -> usize {
        self.max_pending - self.pending.available_permits()
    }

    /// 队列中尚未被分发的通知数
    pub fn queued(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }
}
