//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! - `room`: 방(Room), 방 스냅샷, 방 생성 요청
//!
//! WebSocket으로 주고받는 이벤트 타입은 `realtime::events`에 있습니다.
//!
//! `pub use X::*;`는 하위 모듈의 모든 공개 항목을
//! 이 모듈에서 바로 접근할 수 있게 재공개(re-export)합니다.
//! 예: `crate::models::room::Room` 대신 `crate::models::Room`으로 접근 가능

pub mod room;

pub use room::*;
