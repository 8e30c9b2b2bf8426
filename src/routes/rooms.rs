//! # 방(Room) 라우트 핸들러
//!
//! 실시간 프로토콜에 참여하지 않고 방 정보를 조회/생성하는 HTTP 핸들러입니다.
//!
//! ## 엔드포인트
//! - `POST /api/rooms`           → 새 방 생성 (`201`), 이미 열린 ID면 그 방을 그대로 반환 (`200`)
//! - `GET  /api/rooms/{room_id}` → 방 정보 조회 (`200` 또는 `404 ROOM_NOT_FOUND`)

use crate::{
    error::AppError,
    models::{CreateRoomRequest, Room},
    routes::AppState,
    services::OpenedRoom,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};

/// `POST /rooms` — 새 방을 만듭니다.
///
/// 요청 본문은 없어도 되고, `{ "roomId": "..." }`로 ID를 지정할 수도 있습니다.
/// 그래서 `Json` extractor 대신 `Bytes`로 받아 직접 파싱합니다.
/// (`Json`은 본문이 비어 있거나 Content-Type이 없으면 요청을 거부하기 때문)
///
/// 같은 ID의 방이 이미 열려 있으면 초기화하지 않고 그 방을 `200`으로 돌려줍니다.
pub async fn create_room(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Room>), AppError> {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        CreateRoomRequest::default()
    } else {
        serde_json::from_slice::<CreateRoomRequest>(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?
    };

    // `?`: StoreError → AppError::Store 자동 변환 (#[from])
    match state.lifecycle.open_room(req.room_id.as_deref())? {
        OpenedRoom::Created(room) => Ok((StatusCode::CREATED, Json(room))),
        OpenedRoom::Existing(room) => Ok((StatusCode::OK, Json(room))),
    }
}

/// `GET /rooms/{room_id}` — 방 하나를 조회합니다.
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<Room>, AppError> {
    let room = state
        .lifecycle
        .store()
        .get(&room_id)?
        .ok_or(AppError::RoomNotFound)?;
    Ok(Json(room))
}
