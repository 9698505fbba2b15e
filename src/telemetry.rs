use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 구조화된 로깅을 초기화합니다.
/// JSON 형식의 로그를 출력하며, RUST_LOG 환경 변수가 없으면 `default_filter`를 사용합니다.
pub fn init_telemetry(default_filter: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .json();

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
        .try_init()
    {
        eprintln!("Telemetry already initialized: {}", e);
    }
}
