//! # 서비스(비즈니스 로직) 모듈
//!
//! 라우트 핸들러와 실시간 프로토콜이 공통으로 사용하는 로직입니다.
//! - `lifecycle`: 방 생성, 인원 증감, 빈 방 지연 삭제

pub mod lifecycle;

pub use lifecycle::*;
