//! # 브로드캐스트 프로토콜 처리기
//!
//! 모든 연결의 이벤트를 하나의 큐(`mpsc`)로 받아 **한 번에 하나씩** 끝까지 처리합니다.
//! 그래서 한 이벤트의 "방 상태 읽기 → 수정 → 브로드캐스트"가
//! 다른 이벤트와 섞이지 않습니다.
//!
//! ## 연결별 상태 머신
//! ```text
//! Disconnected ──Connect──▶ Connected(방 없음) ──join-room(X)──▶ Connected(방 X)
//!                                 ▲                                  │
//!                                 └──────── join-room(Y): X 퇴장 후 Y 입장
//! 어느 상태에서든 Disconnect ──▶ 종료 (세션 정리, 남은 사람에게 user-left)
//! ```
//!
//! 같은 연결의 이벤트는 보낸 순서대로 큐에 들어가므로 순서가 보장됩니다.
//! 서로 다른 연결의 이벤트 사이에는 순서 보장이 없습니다. (마지막 쓰기가 이김)

use crate::error::ProtocolError;
use crate::realtime::events::{ClientEvent, ServerEvent};
use crate::realtime::sessions::{EventSender, SessionId, SessionTracker};
use crate::services::RoomLifecycle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// 명령 큐의 용량. 가득 차면 소켓 읽기 쪽이 기다립니다.
pub const COMMAND_QUEUE_CAPACITY: usize = 1024;

/// WebSocket 핸들러가 처리기 태스크로 보내는 명령
#[derive(Debug)]
pub enum Command {
    /// 새 연결이 열림
    Connect {
        session_id: SessionId,
        sender: EventSender,
    },
    /// 연결이 보낸 이벤트
    Event {
        session_id: SessionId,
        event: ClientEvent,
    },
    /// 연결이 끊김 (전송 계층)
    Disconnect { session_id: SessionId },
}

pub struct ProtocolHandler {
    lifecycle: RoomLifecycle,
    sessions: SessionTracker,
}

impl ProtocolHandler {
    pub fn new(lifecycle: RoomLifecycle) -> Self {
        Self {
            lifecycle,
            sessions: SessionTracker::new(),
        }
    }

    /// 처리기를 백그라운드 태스크로 띄우고, 명령을 보낼 송신부를 반환합니다.
    pub fn spawn(lifecycle: RoomLifecycle) -> (mpsc::Sender<Command>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let handle = tokio::spawn(Self::new(lifecycle).run(rx));
        (tx, handle)
    }

    /// 모든 송신부가 닫힐 때까지 명령을 순서대로 처리합니다.
    pub async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        while let Some(command) = rx.recv().await {
            self.handle(command);
        }
        tracing::debug!("Protocol handler stopped");
    }

    /// 명령 하나를 끝까지 처리합니다. 중간에 await 지점이 없습니다.
    pub fn handle(&mut self, command: Command) {
        match command {
            Command::Connect { session_id, sender } => {
                self.sessions.open(session_id, sender);
                tracing::debug!(
                    session_id = %session_id,
                    sessions = self.sessions.session_count(),
                    "Session opened"
                );
            }
            Command::Event { session_id, event } => {
                if !self.sessions.is_open(session_id) {
                    tracing::warn!(session_id = %session_id, "Event from unknown session ignored");
                    return;
                }
                match event {
                    ClientEvent::JoinRoom(room_id) => self.on_join(session_id, room_id.as_deref()),
                    ClientEvent::CodeUpdate {
                        room_id,
                        code,
                        language,
                    } => self.on_code_update(
                        session_id,
                        room_id.as_deref(),
                        code.as_deref(),
                        language.as_deref(),
                    ),
                }
            }
            Command::Disconnect { session_id } => self.on_disconnect(session_id),
        }
    }

    /// `join-room`: 입장한 연결에게 현재 상태를, 방 전체에 바뀐 인원을 보냅니다.
    fn on_join(&mut self, session_id: SessionId, room_id: Option<&str>) {
        let snapshot = match self.sessions.join_room(&self.lifecycle, session_id, room_id) {
            Ok(snapshot) => snapshot,
            Err(err) => return self.report(session_id, err),
        };

        tracing::info!(
            session_id = %session_id,
            room_id = %snapshot.room_id,
            user_count = snapshot.user_count,
            "User joined room"
        );

        self.sessions.send_to(
            session_id,
            ServerEvent::CodeUpdate {
                code: snapshot.code,
                language: snapshot.language,
            },
        );
        self.sessions.broadcast(
            &snapshot.room_id,
            ServerEvent::UserJoined {
                user_count: snapshot.user_count,
            },
            None,
        );
    }

    /// `code-update`: 보낸 연결이 실제로 그 방에 있을 때만 반영하고,
    /// 보낸 연결을 **제외한** 방 사람들에게 전달합니다.
    fn on_code_update(
        &mut self,
        session_id: SessionId,
        room_id: Option<&str>,
        code: Option<&str>,
        language: Option<&str>,
    ) {
        let Some(room_id) = room_id.filter(|id| !id.is_empty()) else {
            tracing::debug!(session_id = %session_id, "Edit without room id ignored");
            return;
        };
        if self.sessions.current_room(session_id) != Some(room_id) {
            tracing::debug!(
                session_id = %session_id,
                room_id,
                "Edit for a room the session is not in ignored"
            );
            return;
        }

        match self.lifecycle.update_content(room_id, code, language) {
            Ok(Some(snapshot)) => {
                self.sessions.broadcast(
                    room_id,
                    ServerEvent::CodeUpdate {
                        code: snapshot.code,
                        language: snapshot.language,
                    },
                    Some(session_id),
                );
            }
            Ok(None) => {
                tracing::debug!(room_id, "Edit dropped: room already reclaimed");
            }
            Err(e) => self.report(session_id, e.into()),
        }
    }

    fn on_disconnect(&mut self, session_id: SessionId) {
        if let Err(err) = self.sessions.drop_session(&self.lifecycle, session_id) {
            // 연결이 이미 사라졌으므로 로그만 남깁니다.
            tracing::error!(session_id = %session_id, error = ?err, "Failed to release session");
        }
        tracing::debug!(
            session_id = %session_id,
            sessions = self.sessions.session_count(),
            "Session closed"
        );
    }

    /// 에러를 보낸 연결에게만 `error` 이벤트로 알립니다.
    fn report(&self, session_id: SessionId, err: ProtocolError) {
        match &err {
            ProtocolError::Store(e) => {
                tracing::error!(session_id = %session_id, error = %e, "Room store failure");
            }
            _ => {
                tracing::debug!(session_id = %session_id, error = %err, "Protocol usage error");
            }
        }
        self.sessions.send_to(
            session_id,
            ServerEvent::Error {
                message: err.to_string(),
            },
        );
    }
}
