//! WebSocket 업그레이드 핸들러
//!
//! 연결마다 두 흐름을 돌립니다.
//! - 수신: 클라이언트 프레임 → `ClientEvent` 파싱 → 프로토콜 처리기 큐로 전달
//! - 송신: 처리기가 보낸 `ServerEvent` → JSON 텍스트 프레임
//!
//! 소켓 읽기가 끝나면(닫힘 프레임, 전송 에러) `Disconnect` 명령을 보냅니다.

use crate::error::ProtocolError;
use crate::realtime::events::{ClientEvent, ServerEvent};
use crate::realtime::protocol::Command;
use crate::routes::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

/// `GET /ws` — HTTP 연결을 WebSocket으로 업그레이드합니다.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.commands))
}

async fn handle_socket(socket: WebSocket, commands: mpsc::Sender<Command>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let session_id = Uuid::now_v7();
    tracing::info!(session_id = %session_id, "User connected");

    if commands
        .send(Command::Connect {
            session_id,
            sender: tx.clone(),
        })
        .await
        .is_err()
    {
        tracing::error!(session_id = %session_id, "Protocol handler is not running");
        return;
    }

    // 송신 태스크: 처리기가 이 연결의 송신부를 놓으면(세션 정리 후) 끝납니다.
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sink.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = ?e, "Failed to serialize server event");
                }
            }
        }
    });

    while let Some(msg) = stream.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(session_id = %session_id, error = %e, "WebSocket receive error");
                break;
            }
        };

        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                Ok(event) => {
                    if commands.send(Command::Event { session_id, event }).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id,
                        error = %e,
                        "Failed to parse client event"
                    );
                    let _ = tx.send(ServerEvent::Error {
                        message: ProtocolError::InvalidEvent.to_string(),
                    });
                }
            },
            Message::Close(_) => break,
            // ping/pong은 axum이 처리하고, 바이너리 프레임은 사용하지 않습니다.
            _ => {}
        }
    }

    tracing::info!(session_id = %session_id, "User disconnected");
    let _ = commands.send(Command::Disconnect { session_id }).await;
}
