//! HTTP server over the multi-tenant-db library.
//!
//! Run from repo root: `cargo run -p multi-tenant-server`
//! Requires `JWT_SECRET_KEY`; database settings come from `DB_*` variables or `.env`.

use multi_tenant_db::{app, AppState, Settings};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("multi_tenant_db=info,multi_tenant_server=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let state = AppState::connect(&settings).await?;

    let listener = TcpListener::bind(settings.bind_addr.as_str()).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
    }
    tracing::info!("shutting down");
}
