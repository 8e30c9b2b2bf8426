//! # 데이터 접근 계층 (Data Access Layer)
//!
//! 방 상태를 보관하는 저장소를 모아둔 모듈입니다.
//! 영속 저장소 없이 메모리에만 보관합니다.
//!
//! 하위 모듈:
//! - `rooms`: 방 ID → 방 상태 매핑 (`RoomStore`)
//!
//! 저장소를 직접 바꾸는 것은 `services::lifecycle`뿐이고,
//! REST 핸들러는 조회와 생성만 합니다.

pub mod rooms;

pub use rooms::*;
