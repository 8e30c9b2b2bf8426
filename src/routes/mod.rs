//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들을 모아둔 모듈입니다.
//! Axum에서 핸들러는 HTTP 요청을 받아 응답을 반환하는 async 함수입니다.
//!
//! 각 하위 모듈:
//! - `health`: 서버 상태 확인 (헬스체크)
//! - `rooms`: 방 정보 조회/생성
//!
//! WebSocket 엔드포인트(`/ws`)는 `realtime::handler`에 있습니다.

pub mod health;
pub mod rooms;

pub use health::*;
pub use rooms::*;

use crate::realtime::Command;
use crate::services::RoomLifecycle;
use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::mpsc;

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// 두 필드 모두 내부적으로 `Arc`/채널 핸들이라 clone 비용이 작습니다.
#[derive(Clone)]
pub struct AppState {
    /// 방 생명주기 관리자 (방 저장소를 품고 있음)
    pub lifecycle: RoomLifecycle,
    /// 실시간 프로토콜 처리기 태스크로 명령을 보내는 큐
    pub commands: mpsc::Sender<Command>,
}

/// `/api` 아래에 붙일 REST 라우터를 만듭니다.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/rooms", post(create_room))
        // {room_id}는 URL 경로 파라미터 (Path<String>으로 핸들러에서 추출)
        .route("/rooms/{room_id}", get(get_room))
        .route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RoomStore;
    use crate::services::DEFAULT_IDLE_TIMEOUT;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> (Router, RoomLifecycle) {
        let lifecycle = RoomLifecycle::new(Arc::new(RoomStore::new()), DEFAULT_IDLE_TIMEOUT);
        let (commands, _rx) = mpsc::channel(8);
        let state = AppState {
            lifecycle: lifecycle.clone(),
            commands,
        };
        (Router::new().nest("/api", api_router()).with_state(state), lifecycle)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 10_000).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_rooms(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/rooms")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn create_room_with_generated_id() {
        let (app, lifecycle) = app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/rooms")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::CREATED);
        let room_id = body["roomId"].as_str().unwrap();
        assert!(!room_id.is_empty());
        assert!(body["createdAt"].is_string());
        assert_eq!(body["userCount"], 0);
        assert_eq!(body["code"], "");
        assert_eq!(body["language"], "javascript");
        assert!(lifecycle.store().exists(room_id).unwrap());
    }

    #[tokio::test]
    async fn create_room_with_provided_id() {
        let (app, lifecycle) = app();
        let (status, body) = send(app, post_rooms(r#"{"roomId":"test-room-123"}"#)).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["roomId"], "test-room-123");
        assert!(lifecycle.store().exists("test-room-123").unwrap());
    }

    #[tokio::test]
    async fn create_room_reuses_open_room() {
        let (app, lifecycle) = app();
        lifecycle.join("R1").unwrap();
        lifecycle.update_content("R1", Some("x=1"), None).unwrap();

        let (status, body) = send(app, post_rooms(r#"{"roomId":"R1"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], "x=1");
        assert_eq!(body["userCount"], 1);
    }

    #[tokio::test]
    async fn create_room_rejects_malformed_body() {
        let (app, _) = app();
        let (status, body) = send(app, post_rooms("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn get_existing_room() {
        let (app, lifecycle) = app();
        lifecycle.join("test-room-456").unwrap();
        lifecycle.join("test-room-456").unwrap();
        lifecycle
            .update_content("test-room-456", Some("console.log(\"test\");"), None)
            .unwrap();

        let (status, body) = send(app, get_request("/api/rooms/test-room-456")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["roomId"], "test-room-456");
        assert_eq!(body["userCount"], 2);
        assert_eq!(body["code"], "console.log(\"test\");");
    }

    #[tokio::test]
    async fn get_missing_room_is_404() {
        let (app, _) = app();
        let (status, body) = send(app, get_request("/api/rooms/non-existent-room")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Room not found");
        assert_eq!(body["code"], "ROOM_NOT_FOUND");
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let (app, _) = app();
        let (status, body) = send(app, get_request("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["rooms"], 0);
    }
}
