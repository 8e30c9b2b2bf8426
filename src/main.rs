//! # Coderoom 서버 진입점
//!
//! 여러 클라이언트가 하나의 코드 버퍼("방")를 실시간으로 함께 편집하는 서버입니다.
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. 방 저장소와 생명주기 관리자 생성
//! 4. 실시간 프로토콜 처리기 태스크 시작
//! 5. REST/WebSocket 라우터 설정
//! 6. HTTP 서버 시작

// ── 모듈 선언 ──
mod config;
mod db;
mod error;
mod models;
mod realtime;
mod routes;
mod services;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use config::Config;
use db::RoomStore;
use realtime::ProtocolHandler;
use routes::AppState;
use services::RoomLifecycle;
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,                 // CORS(Cross-Origin Resource Sharing) 설정
    services::{ServeDir, ServeFile}, // 정적 파일 서빙 서비스
    trace::TraceLayer,               // HTTP 요청/응답 로깅 미들웨어
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1단계: 환경변수 로딩 ──
    // .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    // ── 2단계: 로깅(tracing) 초기화 ──
    // RUST_LOG가 없으면 coderoom, tower_http, axum 모듈을 debug 레벨로 설정
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coderoom=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── 3단계: 설정 로딩 ──
    let config = Config::from_env();
    tracing::info!("Starting Coderoom server on {}:{}", config.host, config.port);

    // ── 4단계: 방 저장소 + 실시간 처리기 ──
    // 저장소는 Arc로 감싸 REST 핸들러, 처리기 태스크, 삭제 타이머가 함께 씁니다.
    let store = Arc::new(RoomStore::new());
    let lifecycle = RoomLifecycle::new(store, config.room_idle_timeout);
    let (commands, _protocol) = ProtocolHandler::spawn(lifecycle.clone());

    let state = AppState {
        lifecycle,
        commands,
    };

    // ── 5단계: 라우터 ──
    let app = build_app(state, &config)?;

    // ── 6단계: 서버 시작 ──
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);
    tracing::info!("WebSocket endpoint ready at /ws");

    axum::serve(listener, app).await?;

    Ok(())
}

/// 전체 애플리케이션 라우터를 만듭니다.
///
/// - `/api/*`: REST (방 조회/생성, 헬스체크)
/// - `/ws`: 실시간 프로토콜
/// - 그 외: 프론트엔드 빌드가 있으면 정적 파일 (SPA)
fn build_app(state: AppState, config: &Config) -> Result<Router> {
    // 프론트엔드 출처 하나만 허용합니다. 쿠키 등 자격 증명도 허용하므로
    // 출처/메서드/헤더를 와일드카드(Any)로 둘 수 없습니다.
    let origin = config
        .frontend_url
        .parse::<HeaderValue>()
        .with_context(|| format!("invalid FRONTEND_URL: {}", config.frontend_url))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let router = Router::new()
        .nest("/api", routes::api_router())
        .route("/ws", get(realtime::ws_handler))
        .with_state(state);

    let frontend_dist = Path::new(&config.frontend_dist);
    let router = if frontend_dist.exists() {
        tracing::info!("Serving frontend static files from {}", config.frontend_dist);

        // 찾을 수 없는 경로는 index.html로 돌려보냅니다. (SPA 라우팅)
        let serve_dir = ServeDir::new(frontend_dist)
            .not_found_service(ServeFile::new(frontend_dist.join("index.html")));
        router.fallback_service(serve_dir)
    } else {
        tracing::warn!("Frontend dist directory not found, serving API only");
        router
    };

    Ok(router.layer(cors).layer(TraceLayer::new_for_http()))
}
