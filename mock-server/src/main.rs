use mock_server::{MockConfig, ACCESS_TOKEN, DEFAULT_RATE_LIMIT};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let config = MockConfig {
        access_token: std::env::var("MONICA_ACCESS_TOKEN").unwrap_or_else(|_| ACCESS_TOKEN.to_string()),
        rate_limit: std::env::var("RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT),
    };

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, rate_limit = config.rate_limit, "listening");
    mock_server::run_with(listener, config).await
}
