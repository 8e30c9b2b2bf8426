//! 실시간 이벤트 타입과 직렬화
//!
//! 모든 프레임은 `{"event": <이름>, "data": <페이로드>}` 형태의 JSON 텍스트입니다.

use serde::{Deserialize, Serialize};

// =============================================================================
// 클라이언트 → 서버
// =============================================================================

/// 클라이언트가 보내는 이벤트
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// `{"event":"join-room","data":"R1"}` — `data`는 null이나 빈 문자열일 수 있음
    JoinRoom(Option<String>),

    /// `{"event":"code-update","data":{"roomId":"R1","code":"...","language":"python"}}`
    CodeUpdate {
        #[serde(rename = "roomId", default)]
        room_id: Option<String>,
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        language: Option<String>,
    },
}

// =============================================================================
// 서버 → 클라이언트
// =============================================================================

/// 서버가 보내는 이벤트
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// 입장한 연결에게 보내는 현재 상태, 또는 다른 사람의 편집 결과
    CodeUpdate { code: String, language: String },

    /// 누군가 입장한 뒤의 인원 (방 전체)
    UserJoined {
        #[serde(rename = "userCount")]
        user_count: u32,
    },

    /// 누군가 나간 뒤의 인원 (남은 방 전체)
    UserLeft {
        #[serde(rename = "userCount")]
        user_count: u32,
    },

    /// 보낸 연결에게만 전달되는 에러
    Error { message: String },
}
