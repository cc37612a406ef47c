//! Notification WebSocket endpoint
//!
//! GET /api/v1/orders/{client_id}/ws
//!
//! 协议:
//! - Server → Client: `Notification` JSON (第一条总是 `Connected`)
//! - Client → Server: 忽略
//!
//! 服务端关闭连接时先发送错误负载，再发送 Close 帧。

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::time::Duration;

use crate::core::ServerState;
use crate::notify::Outbound;

/// GET /api/v1/orders/{client_id}/ws
pub async fn handle_ws(
    State(state): State<ServerState>,
    Path(client_id): Path<i64>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_session(socket, state, client_id))
}

async fn ws_session(socket: WebSocket, state: ServerState, client_id: i64) {
    let (mut sink, mut stream) = socket.split();
    let (connection_id, mut outbound) = state.connections.on_connect(client_id);
    let shutdown = state.shutdown_token.clone();

    let mut ping_interval =
        tokio::time::interval(Duration::from_secs(state.config.ws_ping_interval_secs.max(1)));
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }

            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            msg = outbound.recv() => {
                match msg {
                    Some(Outbound::Text(text)) => {
                        if sink.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Some(Outbound::Close(payload)) => {
                        let _ = sink.send(Message::Text(payload.into())).await;
                        let _ = sink
                            .send(Message::Close(Some(CloseFrame {
                                code: close_code::ERROR,
                                reason: "notification error".into(),
                            })))
                            .await;
                        break;
                    }
                    // 注册表已移除该连接
                    None => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!(connection_id = %connection_id, len = text.len(), "Ignoring inbound message");
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket receive failed");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    state.connections.on_disconnect(connection_id);
}
