//! # 방(Room) 저장소
//!
//! 프로세스 전체에서 공유하는 `방 ID → Room` 매핑입니다.
//! 디스크나 DB에 저장하지 않으므로 프로세스가 끝나면 모든 방이 사라집니다.
//!
//! ## 동시성
//! 저장소는 `Arc<RoomStore>`로 REST 핸들러, 실시간 프로토콜 태스크,
//! 지연 삭제 타이머가 함께 사용합니다. 내부 맵은 `std::sync::Mutex` 하나로
//! 보호되며, 모든 연산은 잠금 한 번 안에서 끝나는 하나의 원자적 단계입니다.
//!
//! 잠금이 poison 상태가 되면(잠금을 쥔 채 패닉이 난 경우) 이후의 모든 연산은
//! `StoreError::Poisoned`를 반환합니다. 정상 사용에서는 일어나지 않는 저장소 손상입니다.

use crate::models::Room;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// 저장소 수준 에러
#[derive(Debug, Error)]
pub enum StoreError {
    /// 잠금을 쥔 스레드가 패닉하여 맵 상태를 더 이상 신뢰할 수 없음
    #[error("room store lock poisoned")]
    Poisoned,

    /// 명시적으로 요청한 방 ID가 이미 열려 있음
    #[error("room already exists: {0}")]
    AlreadyExists(String),
}

/// 잠금 안에서만 접근하는 방 테이블
///
/// Lifecycle Manager가 `RoomStore::transaction()`을 통해 직접 다룹니다.
#[derive(Debug, Default)]
pub struct RoomTable {
    pub rooms: HashMap<String, Room>,
    next_generation: u64,
}

impl RoomTable {
    /// 지연 삭제 타이머에 붙일 새 세대 번호를 발급합니다. (단조 증가)
    pub fn next_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

/// 방 저장소. 전역 싱글턴이 아니라 `AppState`가 소유합니다.
#[derive(Debug, Default)]
pub struct RoomStore {
    table: Mutex<RoomTable>,
}

impl RoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, RoomTable>, StoreError> {
        // PoisonError는 가드를 품고 있어 그대로 전파할 수 없으므로 StoreError로 바꿉니다.
        self.table.lock().map_err(|_| StoreError::Poisoned)
    }

    /// 잠금을 한 번 잡은 상태에서 `f`를 실행합니다.
    ///
    /// 읽기-수정-쓰기 순서가 다른 이벤트와 섞이지 않아야 하는
    /// Lifecycle Manager의 연산들이 이 메서드를 사용합니다.
    pub fn transaction<R>(&self, f: impl FnOnce(&mut RoomTable) -> R) -> Result<R, StoreError> {
        let mut table = self.lock()?;
        Ok(f(&mut table))
    }

    /// ID로 방을 조회합니다. 반환값은 복사본이므로 이후 변경과 무관합니다.
    pub fn get(&self, room_id: &str) -> Result<Option<Room>, StoreError> {
        Ok(self.lock()?.rooms.get(room_id).cloned())
    }

    #[allow(dead_code)]
    pub fn exists(&self, room_id: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.rooms.contains_key(room_id))
    }

    /// 새 방을 만듭니다.
    ///
    /// - `room_id`가 None이거나 빈 문자열이면 UUIDv7으로 ID를 생성합니다.
    /// - 명시한 ID의 방이 이미 있으면 `StoreError::AlreadyExists`를 반환합니다.
    ///   기존 방은 건드리지 않습니다.
    pub fn create(&self, room_id: Option<&str>) -> Result<Room, StoreError> {
        let mut table = self.lock()?;

        let room_id = match room_id.filter(|id| !id.is_empty()) {
            Some(id) if table.rooms.contains_key(id) => {
                return Err(StoreError::AlreadyExists(id.to_string()));
            }
            Some(id) => id.to_string(),
            None => uuid::Uuid::now_v7().to_string(),
        };

        let room = Room::new(room_id.clone());
        table.rooms.insert(room_id, room.clone());
        Ok(room)
    }

    /// 방을 제거하고, 있었다면 제거된 방을 돌려줍니다.
    #[allow(dead_code)]
    pub fn delete(&self, room_id: &str) -> Result<Option<Room>, StoreError> {
        Ok(self.lock()?.rooms.remove(room_id))
    }

    /// 현재 열린 방 개수 (헬스체크, 테스트용)
    pub fn room_count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.rooms.len())
    }

    /// 모든 방을 지웁니다. (테스트 정리용)
    #[cfg(test)]
    pub fn clear(&self) -> Result<(), StoreError> {
        self.lock()?.rooms.clear();
        Ok(())
    }
}
