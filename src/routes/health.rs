//! # 헬스체크(Health Check) 핸들러
//!
//! 서버가 정상적으로 동작하는지 확인하는 엔드포인트입니다.
//!
//! ## 엔드포인트
//! - `GET /api/health` → `{ "status": "ok", "rooms": 3 }`
//!
//! `rooms`는 현재 열린 방 개수로, 운영 모니터링용입니다.
//! 방 저장소 잠금이 손상되었으면 500을 반환하므로 헬스체크가 실패합니다.

use crate::{error::AppError, routes::AppState};
use axum::{extract::State, Json};
use serde_json::{json, Value};

/// `GET /health` — 서버 상태를 확인합니다.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let rooms = state.lifecycle.store().room_count()?;
    Ok(Json(json!({
        "status": "ok",
        "rooms": rooms
    })))
}
