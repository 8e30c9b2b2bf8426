//! # 실시간 동기화 모듈
//!
//! 방의 공유 버퍼를 여러 연결 사이에서 실시간으로 맞추는 WebSocket 프로토콜입니다.
//!
//! 구성:
//! - `events`: 클라이언트/서버 이벤트 타입 (JSON 프레임)
//! - `sessions`: 연결 ↔ 방 소속 관계 (Session Tracker)
//! - `protocol`: 이벤트를 하나씩 처리하고 결과를 브로드캐스트하는 처리기
//! - `handler`: Axum WebSocket 라우트 핸들러
//!
//! ```text
//! 클라이언트 ─frame─▶ handler ─Command─▶ protocol (단일 태스크)
//!                                          │  ├─ sessions (소속, 송신부)
//!                                          │  └─ services::RoomLifecycle ─▶ db::RoomStore
//! 클라이언트 ◀─frame─ handler ◀─ServerEvent─┘
//! ```

pub mod events;
pub mod handler;
pub mod protocol;
pub mod sessions;

pub use handler::ws_handler;
pub use protocol::{Command, ProtocolHandler};
