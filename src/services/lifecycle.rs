//! # 방 생명주기(Lifecycle) 관리
//!
//! 방이 언제 만들어지고, 인원이 언제 바뀌고, 언제 회수되는지에 대한 정책을 담당합니다.
//! 방 저장소를 변경하는 코드는 모두 이 모듈을 거칩니다.
//!
//! ## 지연 삭제 (Deferred deletion)
//! ```text
//! leave() → user_count == 0 → 세대 번호 N 발급, pending_deletion = Some(N)
//!         → idle_timeout 후 타이머 실행
//!              ├─ 방 없음                    → 아무것도 안 함
//!              ├─ pending_deletion != Some(N) → 더 새로운 타이머가 있음, 아무것도 안 함
//!              ├─ user_count > 0              → pending_deletion 해제, 방 유지
//!              └─ user_count == 0             → 방 삭제
//! ```
//! 다시 입장해도 타이머를 취소하지 않습니다. 대신 타이머가 실행 시점에
//! 인원을 다시 확인합니다. 방이 다시 비면 새 세대 번호가 이전 타이머를 대체하므로,
//! 빈 방은 항상 마지막으로 비워진 시점부터 유휴 시간 전체를 보장받습니다.

use crate::db::{RoomStore, StoreError};
use crate::models::{Room, RoomSnapshot};
use std::sync::Arc;
use std::time::Duration;

/// 빈 방을 회수하기 전까지 기다리는 기본 유휴 시간
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// REST 생성 요청의 결과
#[derive(Debug)]
pub enum OpenedRoom {
    /// 새로 만든 방
    Created(Room),
    /// 같은 ID로 이미 열려 있던 방 (변경 없이 재사용)
    Existing(Room),
}

/// 지연 삭제 타이머가 실행된 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reclaim {
    Deleted,
    Reoccupied,
    Superseded,
    Gone,
}

/// 방 생명주기 관리자
///
/// `Clone`은 저장소 `Arc`만 복제하므로 가볍습니다.
#[derive(Debug, Clone)]
pub struct RoomLifecycle {
    store: Arc<RoomStore>,
    idle_timeout: Duration,
}

impl RoomLifecycle {
    pub fn new(store: Arc<RoomStore>, idle_timeout: Duration) -> Self {
        Self {
            store,
            idle_timeout,
        }
    }

    pub fn store(&self) -> &Arc<RoomStore> {
        &self.store
    }

    /// REST `POST /rooms`: 방을 새로 열거나, 같은 ID의 열린 방을 그대로 돌려줍니다.
    pub fn open_room(&self, room_id: Option<&str>) -> Result<OpenedRoom, StoreError> {
        match self.store.create(room_id) {
            Ok(room) => {
                tracing::info!(room_id = %room.room_id, "Room created");
                Ok(OpenedRoom::Created(room))
            }
            Err(StoreError::AlreadyExists(id)) => match self.store.get(&id)? {
                Some(room) => Ok(OpenedRoom::Existing(room)),
                // 조회 직전에 회수된 경우: 새로 만듭니다.
                None => self.store.create(Some(&id)).map(OpenedRoom::Created),
            },
            Err(e) => Err(e),
        }
    }

    /// 연결 하나를 방에 붙입니다.
    ///
    /// 방이 없으면 빈 버퍼와 기본 언어로 만든 뒤 인원을 1 늘립니다.
    /// 예약된 삭제 타이머는 취소하지 않습니다. (모듈 문서 참고)
    ///
    /// 반환된 스냅샷의 `code`/`language`는 입장 전과 같고, `user_count`는 입장 후 값입니다.
    pub fn join(&self, room_id: &str) -> Result<RoomSnapshot, StoreError> {
        self.store.transaction(|table| {
            let room = table
                .rooms
                .entry(room_id.to_string())
                .or_insert_with(|| {
                    tracing::info!(room_id, "Room created on first join");
                    Room::new(room_id.to_string())
                });
            room.user_count = room.user_count.saturating_add(1);
            room.snapshot()
        })
    }

    /// 연결 하나를 방에서 뗍니다.
    ///
    /// - 방이 이미 회수되었으면 `Ok(None)` (예상된 경합이며 에러가 아님)
    /// - 인원은 0 아래로 내려가지 않습니다.
    /// - 인원이 0이 되면 지연 삭제를 예약합니다.
    pub fn leave(&self, room_id: &str) -> Result<Option<RoomSnapshot>, StoreError> {
        let outcome = self.store.transaction(|table| {
            let snapshot = {
                let room = table.rooms.get_mut(room_id)?;
                room.user_count = room.user_count.saturating_sub(1);
                room.snapshot()
            };
            if snapshot.user_count > 0 {
                return Some((snapshot, None));
            }

            let generation = table.next_generation();
            if let Some(room) = table.rooms.get_mut(room_id) {
                room.pending_deletion = Some(generation);
            }
            Some((snapshot, Some(generation)))
        })?;

        let Some((snapshot, generation)) = outcome else {
            tracing::debug!(room_id, "Leave ignored: room already reclaimed");
            return Ok(None);
        };

        if let Some(generation) = generation {
            self.schedule_deletion(room_id, generation);
        }
        Ok(Some(snapshot))
    }

    /// 방의 버퍼와 언어를 덮어씁니다.
    ///
    /// - `code`가 None이면 빈 문자열로 덮어씁니다.
    /// - `language`는 비어 있지 않은 값이 올 때만 바꿉니다.
    /// - 방이 없으면 `Ok(None)`: 호출자는 이벤트를 조용히 버립니다.
    pub fn update_content(
        &self,
        room_id: &str,
        code: Option<&str>,
        language: Option<&str>,
    ) -> Result<Option<RoomSnapshot>, StoreError> {
        self.store.transaction(|table| {
            let room = table.rooms.get_mut(room_id)?;
            room.code = code.unwrap_or_default().to_string();
            if let Some(language) = language.filter(|l| !l.is_empty()) {
                room.language = language.to_string();
            }
            Some(room.snapshot())
        })
    }

    fn schedule_deletion(&self, room_id: &str, generation: u64) {
        let store = Arc::clone(&self.store);
        let idle_timeout = self.idle_timeout;
        let room_id = room_id.to_string();

        tracing::debug!(
            room_id = %room_id,
            generation,
            idle_secs = idle_timeout.as_secs(),
            "Room empty, deletion scheduled"
        );

        tokio::spawn(async move {
            tokio::time::sleep(idle_timeout).await;

            match reclaim_if_idle(&store, &room_id, generation) {
                Ok(Reclaim::Deleted) => {
                    tracing::info!(room_id = %room_id, "Room deleted (empty)");
                }
                Ok(outcome) => {
                    tracing::debug!(room_id = %room_id, generation, ?outcome, "Room kept");
                }
                Err(e) => {
                    tracing::error!(room_id = %room_id, error = %e, "Deferred room deletion failed");
                }
            }
        });
    }
}

/// 타이머 실행 시점에 방 상태를 다시 확인하고, 여전히 비어 있을 때만 삭제합니다.
fn reclaim_if_idle(store: &RoomStore, room_id: &str, generation: u64) -> Result<Reclaim, StoreError> {
    store.transaction(|table| {
        let Some(room) = table.rooms.get_mut(room_id) else {
            return Reclaim::Gone;
        };
        if room.pending_deletion != Some(generation) {
            return Reclaim::Superseded;
        }

        room.pending_deletion = None;
        if room.user_count > 0 {
            return Reclaim::Reoccupied;
        }

        table.rooms.remove(room_id);
        Reclaim::Deleted
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_LANGUAGE;

    fn lifecycle() -> RoomLifecycle {
        RoomLifecycle::new(Arc::new(RoomStore::new()), DEFAULT_IDLE_TIMEOUT)
    }

    fn pending(lifecycle: &RoomLifecycle, room_id: &str) -> Option<u64> {
        lifecycle
            .store()
            .get(room_id)
            .unwrap()
            .and_then(|room| room.pending_deletion)
    }

    #[tokio::test]
    async fn join_creates_room_on_first_reference() {
        let lc = lifecycle();
        let snapshot = lc.join("R1").unwrap();

        assert_eq!(snapshot.user_count, 1);
        assert_eq!(snapshot.code, "");
        assert_eq!(snapshot.language, DEFAULT_LANGUAGE);
        assert!(lc.store().exists("R1").unwrap());
    }

    #[tokio::test]
    async fn user_count_tracks_joins_and_leaves_and_never_goes_negative() {
        let lc = lifecycle();
        lc.join("R1").unwrap();
        lc.join("R1").unwrap();
        assert_eq!(lc.join("R1").unwrap().user_count, 3);

        assert_eq!(lc.leave("R1").unwrap().unwrap().user_count, 2);
        assert_eq!(lc.leave("R1").unwrap().unwrap().user_count, 1);
        assert_eq!(lc.leave("R1").unwrap().unwrap().user_count, 0);
        assert_eq!(lc.leave("R1").unwrap().unwrap().user_count, 0);
    }

    #[tokio::test]
    async fn leave_on_missing_room_is_a_no_op() {
        let lc = lifecycle();
        assert!(lc.leave("missing").unwrap().is_none());
        assert!(!lc.store().exists("missing").unwrap());
    }

    #[tokio::test]
    async fn update_content_overwrites_code_and_keeps_language_when_absent() {
        let lc = lifecycle();
        lc.join("R1").unwrap();

        let snap = lc.update_content("R1", Some("print(1)"), Some("python")).unwrap().unwrap();
        assert_eq!(snap.code, "print(1)");
        assert_eq!(snap.language, "python");

        let snap = lc.update_content("R1", Some("x"), Some("")).unwrap().unwrap();
        assert_eq!(snap.language, "python");

        let snap = lc.update_content("R1", None, None).unwrap().unwrap();
        assert_eq!(snap.code, "");
        assert_eq!(snap.language, "python");
    }

    #[tokio::test]
    async fn update_content_on_missing_room_returns_none() {
        let lc = lifecycle();
        assert!(lc.update_content("gone", Some("x"), None).unwrap().is_none());
        assert!(!lc.store().exists("gone").unwrap());
    }

    #[tokio::test]
    async fn open_room_reuses_existing_room_unchanged() {
        let lc = lifecycle();
        assert!(matches!(lc.open_room(Some("R1")).unwrap(), OpenedRoom::Created(_)));
        lc.join("R1").unwrap();
        lc.update_content("R1", Some("keep me"), None).unwrap();

        match lc.open_room(Some("R1")).unwrap() {
            OpenedRoom::Existing(room) => {
                assert_eq!(room.code, "keep me");
                assert_eq!(room.user_count, 1);
            }
            other => panic!("expected existing room, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn empty_room_survives_until_idle_interval_elapses() {
        let lc = lifecycle();
        lc.join("R1").unwrap();
        lc.leave("R1").unwrap();
        assert!(pending(&lc, "R1").is_some());

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(lc.store().exists("R1").unwrap());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!lc.store().exists("R1").unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn rejoin_during_grace_period_keeps_room_and_content() {
        let lc = lifecycle();
        lc.join("R1").unwrap();
        lc.update_content("R1", Some("x=1"), Some("python")).unwrap();
        lc.leave("R1").unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        lc.join("R1").unwrap();
        // 재입장해도 타이머는 취소되지 않습니다.
        assert!(pending(&lc, "R1").is_some());

        tokio::time::sleep(Duration::from_secs(31)).await;
        let room = lc.store().get("R1").unwrap().unwrap();
        assert_eq!(room.code, "x=1");
        assert_eq!(room.language, "python");
        assert_eq!(room.user_count, 1);
        assert!(room.pending_deletion.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_empty_period_supersedes_older_timer() {
        let lc = lifecycle();
        lc.join("R1").unwrap();
        lc.leave("R1").unwrap();
        let first = pending(&lc, "R1");

        tokio::time::sleep(Duration::from_secs(40)).await;
        lc.join("R1").unwrap();
        lc.leave("R1").unwrap();
        let second = pending(&lc, "R1");
        assert_ne!(first, second);

        // 첫 타이머(60초 시점)는 무시되어야 합니다.
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert!(lc.store().exists("R1").unwrap());

        // 두 번째 타이머(100초 시점)에서 삭제됩니다.
        tokio::time::sleep(Duration::from_secs(40)).await;
        assert!(!lc.store().exists("R1").unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn recreated_room_is_not_deleted_by_stale_timer() {
        let lc = lifecycle();
        lc.join("R1").unwrap();
        lc.leave("R1").unwrap();

        lc.store().delete("R1").unwrap();
        lc.open_room(Some("R1")).unwrap();

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(lc.store().exists("R1").unwrap());
    }
}
