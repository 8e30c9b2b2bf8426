use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 새 방의 기본 언어 태그
pub const DEFAULT_LANGUAGE: &str = "javascript";

/// 하나의 공유 편집 방. Room Store가 유일하게 소유합니다.
///
/// REST 응답으로 그대로 직렬화되며, JSON 필드는 camelCase를 사용합니다.
/// 예: `{ "roomId": "R1", "createdAt": "...", "userCount": 0, "code": "", "language": "javascript" }`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: String,
    pub created_at: DateTime<Utc>,
    /// 현재 이 방에 붙어 있는 연결 수 (u32이므로 음수가 될 수 없음)
    pub user_count: u32,
    pub code: String,
    pub language: String,
    /// 예약된 지연 삭제 타이머의 세대(generation) 번호.
    /// 타이머가 예약되어 아직 처리되지 않은 동안에만 Some입니다.
    #[serde(skip)]
    pub pending_deletion: Option<u64>,
}

impl Room {
    pub fn new(room_id: String) -> Self {
        Self {
            room_id,
            created_at: Utc::now(),
            user_count: 0,
            code: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            pending_deletion: None,
        }
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.room_id.clone(),
            code: self.code.clone(),
            language: self.language.clone(),
            user_count: self.user_count,
        }
    }
}

/// 특정 시점에 외부로 보이는 방 상태 (브로드캐스트용 복사본)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub room_id: String,
    pub code: String,
    pub language: String,
    pub user_count: u32,
}

/// `POST /api/rooms`의 요청 본문 — 본문 자체와 `roomId` 모두 생략 가능
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub room_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_room_starts_empty() {
        let room = Room::new("R1".to_string());
        assert_eq!(room.user_count, 0);
        assert_eq!(room.code, "");
        assert_eq!(room.language, DEFAULT_LANGUAGE);
        assert!(room.pending_deletion.is_none());
    }

    #[test]
    fn room_serializes_camel_case_without_pending_deletion() {
        let mut room = Room::new("R1".to_string());
        room.pending_deletion = Some(3);

        let json = serde_json::to_value(&room).unwrap();
        assert_eq!(json["roomId"], "R1");
        assert_eq!(json["userCount"], 0);
        assert_eq!(json["code"], "");
        assert_eq!(json["language"], "javascript");
        assert!(json["createdAt"].is_string());
        assert!(json.get("pendingDeletion").is_none());
        assert!(json.get("pending_deletion").is_none());
    }

    #[test]
    fn create_request_accepts_missing_room_id() {
        let req: CreateRoomRequest = serde_json::from_str("{}").unwrap();
        assert!(req.room_id.is_none());

        let req: CreateRoomRequest = serde_json::from_str(r#"{"roomId":"abc"}"#).unwrap();
        assert_eq!(req.room_id.as_deref(), Some("abc"));
    }
}
