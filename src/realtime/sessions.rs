//! # 세션 추적기 (Session Tracker)
//!
//! 연결(세션)마다 "지금 어느 방에 있는지"를 기록하고,
//! 방마다 "어떤 연결들이 있는지"를 기록합니다.
//!
//! ## 불변식
//! 하나의 연결은 동시에 최대 하나의 방에만 속합니다.
//! 다른 방에 입장하면 이전 방에서 먼저 나가고, 이전 방에 남은 사람들에게
//! 바뀐 인원(`user-left`)을 알린 뒤 새 방에 붙습니다.
//!
//! 세션은 방 ID만 들고 있고 방 자체는 소유하지 않습니다.
//! 방 상태는 항상 `RoomLifecycle`(→ 방 저장소)을 통해 읽고 씁니다.

use crate::db::StoreError;
use crate::error::ProtocolError;
use crate::models::RoomSnapshot;
use crate::realtime::events::ServerEvent;
use crate::services::RoomLifecycle;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;
use uuid::Uuid;

/// 연결 하나를 식별하는 ID
pub type SessionId = Uuid;

/// 연결에게 이벤트를 보내는 채널의 송신부
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

#[derive(Debug)]
struct Session {
    sender: EventSender,
    current_room: Option<String>,
}

/// 연결 ↔ 방 소속 관계
#[derive(Debug, Default)]
pub struct SessionTracker {
    sessions: HashMap<SessionId, Session>,
    /// 방 ID → 그 방에 있는 연결들 (브로드캐스트 대상)
    members: HashMap<String, HashSet<SessionId>>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 새 연결을 등록합니다. 아직 어느 방에도 속하지 않습니다.
    pub fn open(&mut self, session_id: SessionId, sender: EventSender) {
        self.sessions.insert(
            session_id,
            Session {
                sender,
                current_room: None,
            },
        );
    }

    pub fn is_open(&self, session_id: SessionId) -> bool {
        self.sessions.contains_key(&session_id)
    }

    pub fn current_room(&self, session_id: SessionId) -> Option<&str> {
        self.sessions
            .get(&session_id)
            .and_then(|s| s.current_room.as_deref())
    }

    /// 방에 있는 연결 수 (브로드캐스트 대상 수)
    #[cfg(test)]
    pub fn member_count(&self, room_id: &str) -> usize {
        self.members.get(room_id).map(HashSet::len).unwrap_or(0)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// 연결을 `room_id` 방에 붙입니다.
    ///
    /// 1. 방 ID가 없거나 비어 있으면 `MissingRoomIdentifier`
    /// 2. 이전 방이 있으면 먼저 나가고 이전 방에 `user-left`를 알림
    /// 3. `RoomLifecycle::join`으로 인원을 늘리고 스냅샷을 반환
    ///
    /// 같은 방에 다시 입장해도 나갔다 들어오는 것으로 처리합니다.
    pub fn join_room(
        &mut self,
        lifecycle: &RoomLifecycle,
        session_id: SessionId,
        room_id: Option<&str>,
    ) -> Result<RoomSnapshot, ProtocolError> {
        let room_id = room_id
            .filter(|id| !id.is_empty())
            .ok_or(ProtocolError::MissingRoomIdentifier)?;

        self.detach(lifecycle, session_id)?;

        let snapshot = lifecycle.join(room_id)?;
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.current_room = Some(room_id.to_string());
        }
        self.members
            .entry(room_id.to_string())
            .or_default()
            .insert(session_id);

        Ok(snapshot)
    }

    /// 연결 종료 시 호출합니다.
    ///
    /// 방에 있었다면 나가고 남은 사람들에게 `user-left`를 알립니다.
    /// 이미 정리된 세션에 다시 호출해도 아무 일도 일어나지 않습니다.
    pub fn drop_session(
        &mut self,
        lifecycle: &RoomLifecycle,
        session_id: SessionId,
    ) -> Result<Option<RoomSnapshot>, ProtocolError> {
        // 저장소 에러가 나도 세션 기록은 지워야 하므로 결과는 나중에 반환합니다.
        let left = self.detach(lifecycle, session_id);
        self.sessions.remove(&session_id);
        Ok(left?)
    }

    /// 현재 방에서 떼어내고, 남은 사람들에게 바뀐 인원을 알립니다.
    fn detach(
        &mut self,
        lifecycle: &RoomLifecycle,
        session_id: SessionId,
    ) -> Result<Option<RoomSnapshot>, StoreError> {
        let Some(room_id) = self
            .sessions
            .get_mut(&session_id)
            .and_then(|s| s.current_room.take())
        else {
            return Ok(None);
        };

        if let Some(members) = self.members.get_mut(&room_id) {
            members.remove(&session_id);
            if members.is_empty() {
                self.members.remove(&room_id);
            }
        }

        let snapshot = lifecycle.leave(&room_id)?;
        if let Some(snapshot) = &snapshot {
            tracing::info!(
                session_id = %session_id,
                room_id = %room_id,
                user_count = snapshot.user_count,
                "User left room"
            );
            self.broadcast(
                &room_id,
                ServerEvent::UserLeft {
                    user_count: snapshot.user_count,
                },
                None,
            );
        }
        Ok(snapshot)
    }

    /// 연결 하나에게만 이벤트를 보냅니다.
    pub fn send_to(&self, session_id: SessionId, event: ServerEvent) {
        let Some(session) = self.sessions.get(&session_id) else {
            return;
        };
        if session.sender.send(event).is_err() {
            tracing::warn!(session_id = %session_id, "Failed to send event (connection closed)");
        }
    }

    /// 방의 모든 연결에게 이벤트를 보냅니다. `except`로 지정한 연결은 건너뜁니다.
    ///
    /// 닫힌 연결로의 전송 실패는 무시합니다. (연결 종료 처리에서 정리됨)
    /// 반환값은 전송에 성공한 연결 수입니다.
    pub fn broadcast(&self, room_id: &str, event: ServerEvent, except: Option<SessionId>) -> usize {
        let Some(members) = self.members.get(room_id) else {
            return 0;
        };

        let mut delivered = 0;
        for session_id in members.iter().filter(|id| Some(**id) != except) {
            let Some(session) = self.sessions.get(session_id) else {
                continue;
            };
            match session.sender.send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    tracing::warn!(session_id = %session_id, "Failed to send event (connection closed)");
                }
            }
        }

        tracing::debug!(room_id, recipients = delivered, event = ?event, "Broadcast to room");
        delivered
    }
}
