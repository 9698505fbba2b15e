use std::net::TcpListener;
use user_auth::configuration::get_configuration;
use user_auth::startup::{run, AppState};
use user_auth::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // 구조화된 로깅 초기화
    init_telemetry("info");

    tracing::info!("Starting application");

    // 설정 로드: SECRET_KEY가 없으면 여기서 종료
    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!(
                backend = ?config.database.backend,
                jwt = ?config.jwt,
                "Configuration loaded successfully"
            );
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    // 저장소 연결
    let state = AppState::build(&configuration).await.map_err(|e| {
        tracing::error!("Failed to initialize stores: {}", e);
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Store initialization error")
    })?;

    // 서버 주소 설정
    let address = configuration.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    // 서버 실행
    run(listener, state)?.await
}
