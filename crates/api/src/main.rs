use anyhow::Context;

use ledger_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ledger_observability::init();

    let config = ApiConfig::from_env();
    let app = ledger_api::app::build_app(&config);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        genesis_height = %config.ledger.genesis_height,
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
