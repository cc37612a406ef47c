//! 监听端口、对外服务，以及有序关闭

use std::time::Duration;

use crate::api;
use crate::core::{Config, Result, ServerState};

pub struct Server {
    config: Config,
    state: ServerState,
}

impl Server {
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    /// 运行直到收到 Ctrl-C 或关闭信号
    ///
    /// 关闭顺序: 停止接受请求 → 取消令牌 (WebSocket 会话和分发器退出)
    /// → 在超时时间内等待分发器结束。
    pub async fn run(&self) -> Result<()> {
        let state = self.state.clone();
        let dispatcher = state.start_background_tasks().await;

        let app = api::build_app().with_state(state.clone());

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Order server listening on {}", listener.local_addr()?);

        let token = state.shutdown_token.clone();
        let shutdown = async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down..."),
                _ = token.cancelled() => tracing::info!("Shutdown requested"),
            }
            token.cancel();
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        state.shutdown();
        if let Some(handle) = dispatcher {
            let timeout = Duration::from_millis(self.config.shutdown_timeout_ms);
            match tokio::time::timeout(timeout, handle).await {
                Ok(Ok(())) => tracing::info!("Dispatcher stopped"),
                Ok(Err(e)) => tracing::error!(error = ?e, "Dispatcher task failed"),
                Err(_) => tracing::warn!(
                    timeout_ms = self.config.shutdown_timeout_ms,
                    "Dispatcher did not stop in time"
                ),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_stops_on_shutdown_signal() {
        let config = Config::for_tests();
        let state = ServerState::initialize(&config).await.unwrap();
        let server = Server::with_state(config, state.clone());

        let running = tokio::spawn(async move { server.run().await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        state.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(5), running)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
