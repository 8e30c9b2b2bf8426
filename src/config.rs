//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목 (모두 선택, 없으면 기본값):
//! - `HOST`: 서버 바인딩 주소 (기본값: "0.0.0.0")
//! - `PORT`: 서버 포트 번호 (기본값: 3001)
//! - `FRONTEND_URL`: CORS로 허용할 프론트엔드 출처 (기본값: "http://localhost:5173")
//! - `ROOM_IDLE_TIMEOUT_SECS`: 빈 방을 삭제하기까지의 유휴 시간(초) (기본값: 60)
//! - `FRONTEND_DIST`: 빌드된 프론트엔드 정적 파일 디렉토리 (기본값: "../frontend/dist")

use crate::services::DEFAULT_IDLE_TIMEOUT;
use std::env;
use std::time::Duration;

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후,
/// 애플리케이션 전체에서 공유됩니다.
#[derive(Debug, Clone)]
pub struct Config {
    /// 서버가 바인딩할 호스트 주소
    pub host: String,
    /// 서버 포트 번호
    /// u16: 0~65535 범위의 부호 없는 16비트 정수. 포트 번호에 딱 맞는 타입입니다.
    pub port: u16,
    /// CORS 허용 출처 (예: "http://localhost:5173")
    pub frontend_url: String,
    /// 빈 방 지연 삭제까지의 유휴 시간
    pub room_idle_timeout: Duration,
    /// 프론트엔드 빌드 결과물 경로
    pub frontend_dist: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            frontend_url: "http://localhost:5173".to_string(),
            room_idle_timeout: DEFAULT_IDLE_TIMEOUT,
            frontend_dist: "../frontend/dist".to_string(),
        }
    }
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// 필수 환경변수가 없으므로 실패하지 않습니다.
    /// 숫자 값을 파싱할 수 없으면 기본값을 사용합니다.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 키 → 값 조회 함수로부터 설정을 만듭니다. (테스트에서는 HashMap 조회를 넘김)
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            // .parse(): 문자열을 u16으로 변환. .ok(): 실패하면 None → 기본값
            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            frontend_url: lookup("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            room_idle_timeout: lookup("ROOM_IDLE_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.room_idle_timeout),
            frontend_dist: lookup("FRONTEND_DIST").unwrap_or(defaults.frontend_dist),
        }
    }
}
