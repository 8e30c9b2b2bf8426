//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 에러 타입을 정의합니다.
//! Rust에서는 예외(exception) 대신 `Result<T, E>` 타입으로 에러를 처리합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError`: REST 핸들러의 에러. `IntoResponse` 구현으로 HTTP 응답으로 자동 변환
//! - `ProtocolError`: WebSocket 이벤트 처리 중의 에러. 보낸 연결에게만 `error` 이벤트로 전달
//!
//! 방이 이미 회수된 뒤 도착한 편집/퇴장은 에러가 아니라 `Ok(None)`으로 다룹니다.
//! 연결 종료와 지연 삭제가 겹치면 자연스럽게 생기는 경합이기 때문입니다.

use crate::db::StoreError;
use axum::{
    http::StatusCode,                   // HTTP 상태 코드 (200, 404, 500 등)
    response::{IntoResponse, Response}, // Axum의 응답 변환 트레이트
    Json,                               // JSON 응답 래퍼
};
use serde_json::json; // json! 매크로: JSON 객체를 간편하게 생성
use thiserror::Error;

/// REST 요청 처리 중 발생할 수 있는 에러 종류
///
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 요청한 방이 없음 (HTTP 404)
    #[error("Room not found")]
    RoomNotFound,

    /// 잘못된 요청 (HTTP 400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 방 저장소 오류 (HTTP 500)
    /// #[from]: StoreError → AppError::Store 자동 변환. 핸들러에서 `?`만 쓰면 됩니다.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 응답 본문은 `{ "message": ..., "code": ... }` 형태입니다.
    /// 저장소 에러는 실제 내용을 로그에만 남기고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::RoomNotFound => (StatusCode::NOT_FOUND, "ROOM_NOT_FOUND", self.to_string()),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Store(ref e) => {
                tracing::error!("Store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "A room store error occurred".to_string(),
                )
            }
        };

        // 결과: { "message": "Room not found", "code": "ROOM_NOT_FOUND" }
        let body = Json(json!({
            "message": message,
            "code": code
        }));

        (status, body).into_response()
    }
}

/// 실시간 이벤트 처리 중의 에러
///
/// Display 메시지가 그대로 `error` 이벤트의 `message`가 됩니다.
/// 어떤 경우에도 연결은 닫지 않습니다.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// `join-room`에 방 ID가 없거나 빈 문자열
    #[error("Room ID is required")]
    MissingRoomIdentifier,

    /// 파싱할 수 없는 이벤트 프레임
    #[error("Invalid event format")]
    InvalidEvent,

    /// 저장소 손상. 원인은 로그에만 남깁니다.
    #[error("Internal server error")]
    Store(#[from] StoreError),
}
